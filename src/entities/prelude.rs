pub use super::listing_likes::Entity as ListingLikes;
pub use super::listing_photos::Entity as ListingPhotos;
pub use super::listings::Entity as Listings;
pub use super::users::Entity as Users;
