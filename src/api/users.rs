use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, ProfileDto, UserDto};
use crate::db::NewUser;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.name.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    if state
        .store()
        .get_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("A user with this email already exists"));
    }

    let user = state
        .store()
        .create_user(
            NewUser {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
                password: payload.password,
            },
            state.security(),
        )
        .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(Json(ApiResponse::success(UserDto {
        id: user.id,
        name: user.name,
        email: user.email,
        phone: user.phone,
        created_at: user.created_at,
    })))
}

/// POST /login
///
/// The failure message never says which of email/password was wrong.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<ProfileDto>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let is_valid = state
        .store()
        .verify_user_password(&payload.email, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user = state
        .store()
        .get_user_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let profile = state.presenter().profile(user).await?;

    Ok(Json(ApiResponse::success(profile)))
}
