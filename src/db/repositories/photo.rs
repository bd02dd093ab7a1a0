use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;

use crate::entities::{listing_photos, prelude::*};

pub struct PhotoRepository {
    conn: DatabaseConnection,
}

impl PhotoRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, listing_id: i32, image_path: &str) -> Result<listing_photos::Model> {
        let model = listing_photos::ActiveModel {
            listing_id: Set(listing_id),
            image_path: Set(image_path.to_string()),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert listing photo")
    }

    /// Insert one photo row per path, in the order given.
    pub async fn add_many(&self, listing_id: i32, image_paths: &[String]) -> Result<()> {
        for path in image_paths {
            self.add(listing_id, path).await?;
        }
        Ok(())
    }

    pub async fn get(&self, id: i32) -> Result<Option<listing_photos::Model>> {
        ListingPhotos::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query photo by id")
    }

    pub async fn list_for_listing(&self, listing_id: i32) -> Result<Vec<listing_photos::Model>> {
        ListingPhotos::find()
            .filter(listing_photos::Column::ListingId.eq(listing_id))
            .order_by_asc(listing_photos::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list photos for listing")
    }

    /// First photo path per listing, one query for the whole page.
    pub async fn first_paths_for_listings(
        &self,
        listing_ids: &[i32],
    ) -> Result<HashMap<i32, String>> {
        if listing_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let photos = ListingPhotos::find()
            .filter(listing_photos::Column::ListingId.is_in(listing_ids.iter().copied()))
            .order_by_asc(listing_photos::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query first photos for listings")?;

        let mut first = HashMap::new();
        for photo in photos {
            first.entry(photo.listing_id).or_insert(photo.image_path);
        }

        Ok(first)
    }

    /// Remove all photo rows of a listing, returning how many were deleted.
    pub async fn delete_for_listing(&self, listing_id: i32) -> Result<u64> {
        let result = ListingPhotos::delete_many()
            .filter(listing_photos::Column::ListingId.eq(listing_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete photos for listing")?;

        Ok(result.rows_affected)
    }
}
