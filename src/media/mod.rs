//! External media host integration. The document store only keeps
//! locators; the binary itself lives with the host behind this trait.

pub mod cloudinary;

pub use cloudinary::CloudinaryClient;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media host request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("media host rejected the request: {0}")]
    Rejected(String),
}

/// What the host hands back for a stored binary
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub public_id: String,
    pub secure_url: String,
    pub bytes: i64,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// Contract with the external media host: store bytes, get back a unique
/// public identifier plus a secure retrieval URL; delete by that identifier.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        folder: &str,
    ) -> Result<MediaUpload, MediaError>;

    async fn delete_image(&self, public_id: &str) -> Result<(), MediaError>;
}
