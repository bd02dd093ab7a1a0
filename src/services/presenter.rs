use anyhow::Result;
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;

use crate::api::types::{ListingDetailDto, ListingPreviewDto, ProfileDto};
use crate::db::Store;
use crate::entities::{listings, users};
use crate::services::ImageService;

/// Shared assembler for every listing-returning endpoint.
///
/// Hydration is batched per page: one query for first photos, one for
/// liker ids and one for owners, instead of a lookup per row.
#[derive(Clone)]
pub struct ListingPresenter {
    store: Store,
    images: Arc<ImageService>,
}

impl ListingPresenter {
    #[must_use]
    pub const fn new(store: Store, images: Arc<ImageService>) -> Self {
        Self { store, images }
    }

    pub async fn previews(
        &self,
        listings: Vec<listings::Model>,
    ) -> Result<Vec<ListingPreviewDto>> {
        let ids: Vec<i32> = listings.iter().map(|l| l.id).collect();
        let owner_ids: Vec<i32> = listings.iter().filter_map(|l| l.user_id).collect();

        let photo_paths = self.store.first_photo_paths(&ids).await?;
        let liker_map = self.store.liker_ids_for_listings(&ids).await?;
        let owners = self.store.users_by_ids(&owner_ids).await?;

        let mut previews = Vec::with_capacity(listings.len());
        for listing in listings {
            let image_base64 = match photo_paths.get(&listing.id) {
                Some(path) => self.encode_stored(path).await?,
                None => None,
            };

            let owner_name = listing
                .user_id
                .and_then(|id| owners.get(&id))
                .map(|u| u.name.clone())
                .unwrap_or_default();

            let liked_by_users = liker_map.get(&listing.id).cloned().unwrap_or_default();

            previews.push(ListingPreviewDto {
                id: listing.id,
                title: listing.title,
                price: listing.price,
                owner_name,
                image_base64,
                liked_by_users,
            });
        }

        Ok(previews)
    }

    pub async fn detail(&self, listing: listings::Model) -> Result<ListingDetailDto> {
        let photo_paths = self.store.first_photo_paths(&[listing.id]).await?;
        let image_base64 = match photo_paths.get(&listing.id) {
            Some(path) => self.encode_stored(path).await?,
            None => None,
        };

        let liked_by_users = self
            .store
            .liker_ids_for_listings(&[listing.id])
            .await?
            .remove(&listing.id)
            .unwrap_or_default();

        let owner = match listing.user_id {
            Some(id) => self.store.get_user_by_id(id).await?,
            None => None,
        };
        let (owner_name, owner_email, owner_phone) = owner.map_or_else(
            || (String::new(), String::new(), String::new()),
            |u| (u.name, u.email, u.phone.unwrap_or_default()),
        );

        Ok(ListingDetailDto {
            id: listing.id,
            title: listing.title,
            price: listing.price,
            created_at: listing.created_at,
            rooms: listing.rooms,
            total_area: listing.total_area,
            kitchen_area: listing.kitchen_area,
            floor: listing.floor,
            total_floors: listing.total_floors,
            deposit: listing.deposit,
            commission_percent: listing.commission_percent,
            utilities_separate: listing.utilities_separate,
            allowed_children: listing.allowed_children,
            allowed_pets: listing.allowed_pets,
            allowed_smoking: listing.allowed_smoking,
            address_city: listing.address_city,
            address_street: listing.address_street,
            address_house: listing.address_house,
            kind: listing.kind,
            description: listing.description,
            user_id: listing.user_id,
            owner_name,
            owner_email,
            owner_phone,
            image_base64,
            liked_by_users,
        })
    }

    /// Login response: the user's profile with an inline photo.
    pub async fn profile(&self, user: users::Model) -> Result<ProfileDto> {
        let photo_base64 = match &user.image_path {
            Some(path) => self.encode_stored(path).await?,
            None => None,
        };

        Ok(ProfileDto {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            created_at: user.created_at,
            photo_base64,
        })
    }

    /// Null when the backing file has gone missing on disk.
    async fn encode_stored(&self, path: &str) -> Result<Option<String>> {
        let bytes = self.images.load(path).await?;
        Ok(bytes.map(|b| general_purpose::STANDARD.encode(b)))
    }
}
