use base64::{Engine as _, engine::general_purpose};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid base64 image payload: {0}")]
    InvalidBase64(String),

    #[error("Image I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Disk-backed photo storage. Listing photos get collision-free uuid
/// filenames; user photos live at a path keyed by user id so a re-upload
/// overwrites the previous file.
pub struct ImageService {
    listings_dir: PathBuf,
    users_dir: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            listings_dir: PathBuf::from(&config.listing_images_path),
            users_dir: PathBuf::from(&config.user_images_path),
        }
    }

    /// Decode an inline base64 payload and store it as a new listing photo.
    /// Returns the stored path, as persisted in the photo row.
    pub async fn save_listing_image(
        &self,
        payload: &str,
        extension: &str,
    ) -> Result<String, ImageError> {
        let encoded = strip_data_uri(payload);
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;

        let ext = normalize_extension(extension);
        let filename = format!("{}.{ext}", Uuid::new_v4());
        let path = self.listings_dir.join(&filename);

        fs::create_dir_all(&self.listings_dir).await?;
        fs::write(&path, &bytes).await?;

        info!(path = %path.display(), size = bytes.len(), "Listing photo stored");

        Ok(path.to_string_lossy().into_owned())
    }

    /// Store an uploaded profile photo at the user's fixed path.
    pub async fn save_user_image(
        &self,
        user_id: i32,
        original_filename: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, ImageError> {
        let ext = original_filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");

        let filename = format!("user_{user_id}.{ext}");
        let path = self.users_dir.join(&filename);

        fs::create_dir_all(&self.users_dir).await?;
        fs::write(&path, bytes).await?;

        info!(path = %path.display(), size = bytes.len(), "User photo stored");

        Ok(path.to_string_lossy().into_owned())
    }

    /// Read a stored photo. A missing file is not an error: responses
    /// render it as a null image.
    pub async fn load(&self, path: &str) -> Result<Option<Vec<u8>>, ImageError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ImageError::Io(e)),
        }
    }

    /// Best-effort removal, used to clean up after a failed row insert.
    pub async fn remove(&self, path: &str) {
        if let Err(e) = fs::remove_file(path).await {
            warn!(path, error = %e, "Failed to remove stored photo");
        }
    }
}

/// Uploads may carry a `data:<mime>;base64,` scheme marker before the
/// payload proper.
fn strip_data_uri(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some(idx) = payload.find("base64,") {
            return &payload[idx + "base64,".len()..];
        }
    }
    payload
}

fn normalize_extension(extension: &str) -> &str {
    let ext = extension.trim().trim_start_matches('.');
    if ext.is_empty() { "jpg" } else { ext }
}
