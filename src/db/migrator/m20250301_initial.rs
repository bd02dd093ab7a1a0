use crate::entities::listing_likes;
use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Listings)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ListingPhotos)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ListingLikes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // A user likes a listing at most once. The API layer checks first,
        // the index catches concurrent double-inserts.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_listing_likes_listing_user")
                    .table(ListingLikes)
                    .col(listing_likes::Column::ListingId)
                    .col(listing_likes::Column::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ListingLikes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ListingPhotos).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Listings).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
