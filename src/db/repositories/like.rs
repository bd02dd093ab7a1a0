use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;

use crate::entities::{listing_likes, prelude::*};

pub struct LikeRepository {
    conn: DatabaseConnection,
}

impl LikeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, listing_id: i32, user_id: i32) -> Result<bool> {
        let like = ListingLikes::find()
            .filter(listing_likes::Column::ListingId.eq(listing_id))
            .filter(listing_likes::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query like")?;

        Ok(like.is_some())
    }

    pub async fn add(&self, listing_id: i32, user_id: i32) -> Result<()> {
        let model = listing_likes::ActiveModel {
            listing_id: Set(listing_id),
            user_id: Set(user_id),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert like")?;

        Ok(())
    }

    /// Remove the like row. Returns false when none existed.
    pub async fn remove(&self, listing_id: i32, user_id: i32) -> Result<bool> {
        let result = ListingLikes::delete_many()
            .filter(listing_likes::Column::ListingId.eq(listing_id))
            .filter(listing_likes::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete like")?;

        Ok(result.rows_affected > 0)
    }

    /// Liker ids per listing in like-insertion order, one query per page.
    pub async fn liker_ids_for_listings(
        &self,
        listing_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<i32>>> {
        if listing_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let likes = ListingLikes::find()
            .filter(listing_likes::Column::ListingId.is_in(listing_ids.iter().copied()))
            .order_by_asc(listing_likes::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query likes for listings")?;

        let mut map: HashMap<i32, Vec<i32>> = HashMap::new();
        for like in likes {
            map.entry(like.listing_id).or_default().push(like.user_id);
        }

        Ok(map)
    }

    pub async fn delete_for_listing(&self, listing_id: i32) -> Result<u64> {
        let result = ListingLikes::delete_many()
            .filter(listing_likes::Column::ListingId.eq(listing_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete likes for listing")?;

        Ok(result.rows_affected)
    }
}
