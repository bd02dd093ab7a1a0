use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Built once at creation from rooms/area/floor, never recomputed.
    pub title: String,

    pub price: i64,

    pub created_at: String,

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

    /// Listing category, free text ("type" in the wire format).
    #[sea_orm(column_name = "type")]
    pub kind: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub user_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Owner,
    #[sea_orm(has_many = "super::listing_photos::Entity")]
    Photos,
    #[sea_orm(has_many = "super::listing_likes::Entity")]
    Likes,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::listing_photos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl Related<super::listing_likes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
