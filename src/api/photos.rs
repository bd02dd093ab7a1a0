use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse, PhotoUploadResponse};

#[derive(Deserialize)]
pub struct ListingPhotoUpload {
    pub image_base64: String,
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "jpg".to_string()
}

/// GET /user-photo/{id}
pub async fn get_user_photo(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Response, ApiError> {
    let user = state
        .store()
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user_id))?;

    let path = user
        .image_path
        .ok_or_else(|| ApiError::not_found("Photo for user", user_id))?;

    serve_stored_photo(&state, &path, || {
        ApiError::not_found("Photo for user", user_id)
    })
    .await
}

/// POST /user-photo/{id}
///
/// Multipart upload; the file lands at a path keyed by the user id, so a
/// re-upload overwrites the previous photo.
pub async fn upload_user_photo(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if state.store().get_user_by_id(user_id).await?.is_none() {
        return Err(ApiError::user_missing(user_id));
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
        .ok_or_else(|| ApiError::validation("Multipart body contains no file"))?;

    let filename = field.file_name().map(ToString::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation(format!("Failed to read uploaded file: {e}")))?;

    let path = state
        .images()
        .save_user_image(user_id, filename.as_deref(), &bytes)
        .await?;

    state.store().set_user_image(user_id, &path).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Photo uploaded".to_string(),
    })))
}

/// GET /listing-photo/{id}
///
/// `{id}` is the photo id reported by the upload.
pub async fn get_listing_photo(
    State(state): State<Arc<AppState>>,
    Path(photo_id): Path<i32>,
) -> Result<Response, ApiError> {
    let photo = state
        .store()
        .get_photo(photo_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Photo", photo_id))?;

    serve_stored_photo(&state, &photo.image_path, || {
        ApiError::not_found("Photo", photo_id)
    })
    .await
}

/// POST /listing-photo/{id}
///
/// `{id}` is the listing id; the body carries an inline base64 payload,
/// optionally prefixed with a data-URI scheme marker.
pub async fn upload_listing_photo(
    State(state): State<Arc<AppState>>,
    Path(listing_id): Path<i32>,
    Json(payload): Json<ListingPhotoUpload>,
) -> Result<Json<ApiResponse<PhotoUploadResponse>>, ApiError> {
    if state.store().get_listing(listing_id).await?.is_none() {
        return Err(ApiError::listing_missing(listing_id));
    }

    let path = state
        .images()
        .save_listing_image(&payload.image_base64, &payload.extension)
        .await?;

    // The file is already on disk; if the row doesn't make it, take the
    // file back out instead of leaving an orphan.
    let photo = match state.store().add_listing_photo(listing_id, &path).await {
        Ok(photo) => photo,
        Err(e) => {
            state.images().remove(&path).await;
            return Err(e.into());
        }
    };

    Ok(Json(ApiResponse::success(PhotoUploadResponse {
        photo_id: photo.id,
    })))
}

async fn serve_stored_photo(
    state: &AppState,
    path: &str,
    missing: impl FnOnce() -> ApiError,
) -> Result<Response, ApiError> {
    let Some(bytes) = state.images().load(path).await? else {
        return Err(missing());
    };

    let content_type = mime_guess::from_path(path).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, content_type.to_string())], bytes).into_response())
}
