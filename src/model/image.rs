use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCategory {
    Icon,
    Image,
    Logo,
    Background,
    Avatar,
    Banner,
    Thumbnail,
    Other,
}

impl Default for ImageCategory {
    fn default() -> Self {
        ImageCategory::Image
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Active,
    Archived,
    Deleted,
}

impl Default for ImageStatus {
    fn default() -> Self {
        ImageStatus::Active
    }
}

/// An asset library entry. The binary lives on the external media host;
/// this record only carries the locators plus caller metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: Id,
    pub name: String,
    pub original_name: String,
    pub filename: String,
    pub url: String,
    pub cloudinary_public_id: String,
    pub cloudinary_secure_url: String,
    pub mime_type: String,
    pub size: i64,
    pub width: Option<i64>,
    pub height: Option<i64>,
    #[serde(default)]
    pub category: ImageCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub status: ImageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tags arrive either as a JSON array or as a comma-separated string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    CommaSeparated(String),
}

impl TagsInput {
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::List(tags) => tags,
            TagsInput::CommaSeparated(raw) => raw
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

/// Metadata update for an image; the binary and its locators are immutable
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpdate {
    pub name: Option<String>,
    pub category: Option<ImageCategory>,
    pub tags: Option<TagsInput>,
    pub description: Option<String>,
    pub alt: Option<String>,
    pub status: Option<ImageStatus>,
}

/// Strips the extension from an uploaded filename; used to derive the
/// display name and alt text when the caller supplies neither
pub fn filename_stem(original_name: &str) -> String {
    original_name
        .split('.')
        .next()
        .unwrap_or(original_name)
        .to_string()
}
