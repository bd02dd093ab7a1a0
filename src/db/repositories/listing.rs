use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::entities::{listing_likes, listings, prelude::*, users};

/// Attribute set submitted when creating a listing. The title is not part
/// of the input; it is derived from the apartment attributes.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub price: i64,
    pub rooms: i32,
    pub total_area: f64,
    pub kitchen_area: f64,
    pub floor: i32,
    pub total_floors: i32,
    pub deposit: i64,
    pub commission_percent: f64,
    pub utilities_separate: bool,
    pub allowed_children: bool,
    pub allowed_pets: bool,
    pub allowed_smoking: bool,
    pub address_city: String,
    pub address_street: String,
    pub address_house: String,
    pub kind: String,
    pub description: String,
    pub user_id: Option<i32>,
}

/// Selector for the filtered-listings endpoint.
#[derive(Debug, Clone)]
pub enum ListingFilter {
    /// Case-insensitive substring match against the listing city.
    City(String),
    /// Case-insensitive substring match against the owner's display name.
    OwnerName(String),
    /// Listings priced at or below the threshold.
    MaxPrice(i64),
}

pub struct ListingRepository {
    conn: DatabaseConnection,
}

impl ListingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, data: NewListing) -> Result<listings::Model> {
        let title = build_title(data.rooms, data.total_area, data.floor, data.total_floors);
        let now = chrono::Utc::now().to_rfc3339();

        let model = listings::ActiveModel {
            title: Set(title),
            price: Set(data.price),
            created_at: Set(now),
            rooms: Set(data.rooms),
            total_area: Set(data.total_area),
            kitchen_area: Set(data.kitchen_area),
            floor: Set(data.floor),
            total_floors: Set(data.total_floors),
            deposit: Set(data.deposit),
            commission_percent: Set(data.commission_percent),
            utilities_separate: Set(data.utilities_separate),
            allowed_children: Set(data.allowed_children),
            allowed_pets: Set(data.allowed_pets),
            allowed_smoking: Set(data.allowed_smoking),
            address_city: Set(data.address_city),
            address_street: Set(data.address_street),
            address_house: Set(data.address_house),
            kind: Set(data.kind),
            description: Set(data.description),
            user_id: Set(data.user_id),
            ..Default::default()
        };

        let listing = model
            .insert(&self.conn)
            .await
            .context("Failed to insert listing")?;

        Ok(listing)
    }

    pub async fn get(&self, id: i32) -> Result<Option<listings::Model>> {
        Listings::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query listing by id")
    }

    pub async fn list(&self, skip: u64, limit: u64) -> Result<Vec<listings::Model>> {
        Listings::find()
            .order_by_asc(listings::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list listings")
    }

    pub async fn list_by_owner(
        &self,
        user_id: i32,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<listings::Model>> {
        Listings::find()
            .filter(listings::Column::UserId.eq(user_id))
            .order_by_asc(listings::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list listings by owner")
    }

    pub async fn list_liked_by(&self, user_id: i32) -> Result<Vec<listings::Model>> {
        Listings::find()
            .join(JoinType::InnerJoin, listings::Relation::Likes.def())
            .filter(listing_likes::Column::UserId.eq(user_id))
            .order_by_asc(listings::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list liked listings")
    }

    pub async fn filter(&self, filter: ListingFilter) -> Result<Vec<listings::Model>> {
        let query = match filter {
            ListingFilter::City(city) => Listings::find().filter(
                Expr::expr(Func::lower(Expr::col((
                    listings::Entity,
                    listings::Column::AddressCity,
                ))))
                .like(substring_pattern(&city)),
            ),
            ListingFilter::OwnerName(name) => Listings::find()
                .join(JoinType::InnerJoin, listings::Relation::Owner.def())
                .filter(
                    Expr::expr(Func::lower(Expr::col((users::Entity, users::Column::Name))))
                        .like(substring_pattern(&name)),
                ),
            ListingFilter::MaxPrice(max) => {
                Listings::find().filter(listings::Column::Price.lte(max))
            }
        };

        query
            .order_by_asc(listings::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to filter listings")
    }

    /// Delete the listing row itself. Returns false when no row existed.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Listings::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete listing")?;

        Ok(result.rows_affected > 0)
    }
}

/// Title format used by the mobile clients, e.g.
/// `2-к. квартира, 54.5 м², 3/9 эт.`
pub fn build_title(rooms: i32, total_area: f64, floor: i32, total_floors: i32) -> String {
    format!("{rooms}-к. квартира, {total_area} м², {floor}/{total_floors} эт.")
}

fn substring_pattern(value: &str) -> String {
    format!("%{}%", value.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_title() {
        assert_eq!(
            build_title(2, 54.5, 3, 9),
            "2-к. квартира, 54.5 м², 3/9 эт."
        );
        assert_eq!(build_title(1, 33.0, 12, 16), "1-к. квартира, 33 м², 12/16 эт.");
    }

    #[test]
    fn test_substring_pattern_lowercases() {
        assert_eq!(substring_pattern("Moscow"), "%moscow%");
    }
}
