use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, ListingDetailDto, ListingPreviewDto, MessageResponse};
use crate::db::{ListingFilter, NewListing};

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub user_id: i32,
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

#[derive(Deserialize)]
pub struct LikedQuery {
    pub user_id: i32,
}

#[derive(Deserialize)]
pub struct FilterQuery {
    pub query: String,
    pub value: String,
}

#[derive(Deserialize)]
pub struct CreateListingRequest {
    pub price: i64,

    pub rooms: i32,
    pub total_area: f64,
    pub kitchen_area: f64,
    pub floor: i32,
    pub total_floors: i32,

    pub deposit: i64,
    pub commission_percent: f64,
    #[serde(default = "default_true")]
    pub utilities_separate: bool,

    #[serde(default)]
    pub allowed_children: bool,
    #[serde(default)]
    pub allowed_pets: bool,
    #[serde(default)]
    pub allowed_smoking: bool,

    pub address_city: String,
    pub address_street: String,
    pub address_house: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub description: String,

    /// Paths of already-stored photos to attach at creation.
    #[serde(default)]
    pub image_paths: Option<Vec<String>>,

    #[serde(default)]
    pub user_id: Option<i32>,
}

const fn default_limit() -> u64 {
    100
}

const fn default_true() -> bool {
    true
}

/// GET /listings/
pub async fn list_listings(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<ListingPreviewDto>>>, ApiError> {
    let listings = state.store().list_listings(page.skip, page.limit).await?;
    let previews = state.presenter().previews(listings).await?;

    Ok(Json(ApiResponse::success(previews)))
}

/// GET /my-listings/
pub async fn my_listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<Vec<ListingPreviewDto>>>, ApiError> {
    let listings = state
        .store()
        .listings_by_owner(query.user_id, query.skip, query.limit)
        .await?;
    let previews = state.presenter().previews(listings).await?;

    Ok(Json(ApiResponse::success(previews)))
}

/// GET /liked-listings/
pub async fn liked_listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LikedQuery>,
) -> Result<Json<ApiResponse<Vec<ListingPreviewDto>>>, ApiError> {
    let listings = state.store().listings_liked_by(query.user_id).await?;
    let previews = state.presenter().previews(listings).await?;

    Ok(Json(ApiResponse::success(previews)))
}

/// GET /filtered-listings/
///
/// `query` selects the filter kind; an unrecognized kind is a defined
/// no-match and yields an empty list rather than an error.
pub async fn filtered_listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ApiResponse<Vec<ListingPreviewDto>>>, ApiError> {
    let filter = match query.query.as_str() {
        "city" => ListingFilter::City(query.value),
        "user" => ListingFilter::OwnerName(query.value),
        "price" => {
            let max = query.value.trim().parse::<i64>().map_err(|_| {
                ApiError::validation(format!("Invalid price value: {}", query.value))
            })?;
            ListingFilter::MaxPrice(max)
        }
        other => {
            tracing::debug!(query = other, "Unrecognized filter selector");
            return Ok(Json(ApiResponse::success(Vec::new())));
        }
    };

    let listings = state.store().filter_listings(filter).await?;
    let previews = state.presenter().previews(listings).await?;

    Ok(Json(ApiResponse::success(previews)))
}

/// POST /listings/
pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<Json<ApiResponse<ListingDetailDto>>, ApiError> {
    let image_paths = payload.image_paths.unwrap_or_default();

    let data = NewListing {
        price: payload.price,
        rooms: payload.rooms,
        total_area: payload.total_area,
        kitchen_area: payload.kitchen_area,
        floor: payload.floor,
        total_floors: payload.total_floors,
        deposit: payload.deposit,
        commission_percent: payload.commission_percent,
        utilities_separate: payload.utilities_separate,
        allowed_children: payload.allowed_children,
        allowed_pets: payload.allowed_pets,
        allowed_smoking: payload.allowed_smoking,
        address_city: payload.address_city,
        address_street: payload.address_street,
        address_house: payload.address_house,
        kind: payload.kind,
        description: payload.description,
        user_id: payload.user_id,
    };

    let listing = state.store().create_listing(data, &image_paths).await?;
    let detail = state.presenter().detail(listing).await?;

    Ok(Json(ApiResponse::success(detail)))
}

/// GET /listing/{id}
pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ListingDetailDto>>, ApiError> {
    let listing = state
        .store()
        .get_listing(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing", id))?;

    let detail = state.presenter().detail(listing).await?;

    Ok(Json(ApiResponse::success(detail)))
}

/// DELETE /listing/{id}
pub async fn delete_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let deleted = state.store().delete_listing(id).await?;

    if !deleted {
        return Err(ApiError::not_found("Listing", id));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Listing {id} deleted"),
    })))
}
