use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, SecurityConfig};
use crate::db::Store;
use crate::services::{ImageService, ListingPresenter};

mod error;
pub mod likes;
pub mod listings;
pub mod photos;
pub mod types;
pub mod users;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    config: Config,

    store: Store,

    images: Arc<ImageService>,

    presenter: ListingPresenter,
}

impl AppState {
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn images(&self) -> &Arc<ImageService> {
        &self.images
    }

    #[must_use]
    pub const fn presenter(&self) -> &ListingPresenter {
        &self.presenter
    }

    #[must_use]
    pub const fn security(&self) -> &SecurityConfig {
        &self.config.security
    }
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_url,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let images = Arc::new(ImageService::new(&config.storage));
    let presenter = ListingPresenter::new(store.clone(), images.clone());

    Ok(Arc::new(AppState {
        config,
        store,
        images,
        presenter,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route(
            "/listings/",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route("/my-listings/", get(listings::my_listings))
        .route("/liked-listings/", get(listings::liked_listings))
        .route("/filtered-listings/", get(listings::filtered_listings))
        .route(
            "/listing/{id}",
            get(listings::get_listing).delete(listings::delete_listing),
        )
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route(
            "/user-photo/{id}",
            get(photos::get_user_photo).post(photos::upload_user_photo),
        )
        .route(
            "/listing-photo/{id}",
            get(photos::get_listing_photo).post(photos::upload_listing_photo),
        )
        .route("/listing-like", post(likes::like_listing))
        .route("/listing-unlike", delete(likes::unlike_listing))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
