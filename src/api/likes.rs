use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse};

#[derive(Deserialize)]
pub struct LikeQuery {
    pub listing_id: i32,
    pub user_id: i32,
}

/// POST /listing-like
///
/// Idempotent: liking twice is a 200 no-op reporting the existing like.
pub async fn like_listing(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LikeQuery>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    ensure_pair_exists(&state, query.listing_id, query.user_id).await?;

    if state
        .store()
        .like_exists(query.listing_id, query.user_id)
        .await?
    {
        return Ok(Json(ApiResponse::success(MessageResponse {
            message: "Like already exists".to_string(),
        })));
    }

    state
        .store()
        .add_like(query.listing_id, query.user_id)
        .await?;

    tracing::info!(
        listing_id = query.listing_id,
        user_id = query.user_id,
        "Listing liked"
    );

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Like added".to_string(),
    })))
}

/// DELETE /listing-unlike
///
/// Idempotent: unliking a non-existent like is a 200 no-op.
pub async fn unlike_listing(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LikeQuery>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    ensure_pair_exists(&state, query.listing_id, query.user_id).await?;

    let removed = state
        .store()
        .remove_like(query.listing_id, query.user_id)
        .await?;

    if !removed {
        return Ok(Json(ApiResponse::success(MessageResponse {
            message: "Like does not exist".to_string(),
        })));
    }

    tracing::info!(
        listing_id = query.listing_id,
        user_id = query.user_id,
        "Listing unliked"
    );

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Like removed".to_string(),
    })))
}

/// Both like operations require the referenced listing and user to exist.
async fn ensure_pair_exists(
    state: &AppState,
    listing_id: i32,
    user_id: i32,
) -> Result<(), ApiError> {
    if state.store().get_listing(listing_id).await?.is_none() {
        return Err(ApiError::listing_missing(listing_id));
    }

    if state.store().get_user_by_id(user_id).await?.is_none() {
        return Err(ApiError::user_missing(user_id));
    }

    Ok(())
}
