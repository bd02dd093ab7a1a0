use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{listings, users};

pub mod migrator;
pub mod repositories;

pub use repositories::listing::{ListingFilter, NewListing};
pub use repositories::user::NewUser;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn listing_repo(&self) -> repositories::listing::ListingRepository {
        repositories::listing::ListingRepository::new(self.conn.clone())
    }

    fn photo_repo(&self) -> repositories::photo::PhotoRepository {
        repositories::photo::PhotoRepository::new(self.conn.clone())
    }

    fn like_repo(&self) -> repositories::like::LikeRepository {
        repositories::like::LikeRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ========== Listings ==========

    /// Insert the listing row, then one photo row per submitted path.
    pub async fn create_listing(
        &self,
        data: NewListing,
        image_paths: &[String],
    ) -> Result<listings::Model> {
        let listing = self.listing_repo().create(data).await?;

        if !image_paths.is_empty() {
            self.photo_repo().add_many(listing.id, image_paths).await?;
        }

        info!(
            listing_id = listing.id,
            owner = ?listing.user_id,
            photos = image_paths.len(),
            "Listing created"
        );

        Ok(listing)
    }

    pub async fn get_listing(&self, id: i32) -> Result<Option<listings::Model>> {
        self.listing_repo().get(id).await
    }

    pub async fn list_listings(&self, skip: u64, limit: u64) -> Result<Vec<listings::Model>> {
        self.listing_repo().list(skip, limit).await
    }

    pub async fn listings_by_owner(
        &self,
        user_id: i32,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<listings::Model>> {
        self.listing_repo().list_by_owner(user_id, skip, limit).await
    }

    pub async fn listings_liked_by(&self, user_id: i32) -> Result<Vec<listings::Model>> {
        self.listing_repo().list_liked_by(user_id).await
    }

    pub async fn filter_listings(&self, filter: ListingFilter) -> Result<Vec<listings::Model>> {
        self.listing_repo().filter(filter).await
    }

    /// Delete a listing and everything hanging off it. Photo and like rows
    /// go first so the cascade does not depend on the connection's
    /// foreign-key pragma. Returns false when the listing did not exist.
    pub async fn delete_listing(&self, id: i32) -> Result<bool> {
        if self.listing_repo().get(id).await?.is_none() {
            return Ok(false);
        }

        let photos = self.photo_repo().delete_for_listing(id).await?;
        let likes = self.like_repo().delete_for_listing(id).await?;
        self.listing_repo().delete(id).await?;

        info!(listing_id = id, photos, likes, "Listing deleted");

        Ok(true)
    }

    // ========== Photos ==========

    pub async fn add_listing_photo(
        &self,
        listing_id: i32,
        image_path: &str,
    ) -> Result<crate::entities::listing_photos::Model> {
        self.photo_repo().add(listing_id, image_path).await
    }

    pub async fn get_photo(
        &self,
        photo_id: i32,
    ) -> Result<Option<crate::entities::listing_photos::Model>> {
        self.photo_repo().get(photo_id).await
    }

    pub async fn photos_for_listing(
        &self,
        listing_id: i32,
    ) -> Result<Vec<crate::entities::listing_photos::Model>> {
        self.photo_repo().list_for_listing(listing_id).await
    }

    pub async fn first_photo_paths(&self, listing_ids: &[i32]) -> Result<HashMap<i32, String>> {
        self.photo_repo().first_paths_for_listings(listing_ids).await
    }

    // ========== Likes ==========

    pub async fn like_exists(&self, listing_id: i32, user_id: i32) -> Result<bool> {
        self.like_repo().exists(listing_id, user_id).await
    }

    pub async fn add_like(&self, listing_id: i32, user_id: i32) -> Result<()> {
        self.like_repo().add(listing_id, user_id).await
    }

    pub async fn remove_like(&self, listing_id: i32, user_id: i32) -> Result<bool> {
        self.like_repo().remove(listing_id, user_id).await
    }

    pub async fn liker_ids_for_listings(
        &self,
        listing_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<i32>>> {
        self.like_repo().liker_ids_for_listings(listing_ids).await
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        new_user: NewUser,
        config: &SecurityConfig,
    ) -> Result<users::Model> {
        self.user_repo().create(new_user, config).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn users_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, users::Model>> {
        self.user_repo().get_by_ids(ids).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn set_user_image(&self, user_id: i32, path: &str) -> Result<()> {
        self.user_repo().set_image_path(user_id, path).await
    }
}
