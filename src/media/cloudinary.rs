use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::MediaConfig;
use crate::media::{MediaError, MediaHost, MediaUpload};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary-backed media host. Requests are authenticated with the
/// account's api key plus a SHA-256 signature over the sorted parameters
/// and the api secret.
#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    bytes: i64,
    width: Option<i64>,
    height: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryClient {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            base_url: API_BASE.to_string(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", self.base_url, self.cloud_name, action)
    }

    /// Signature over `key=value` pairs sorted by key, joined with `&`,
    /// with the api secret appended
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);
        let to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn unix_timestamp() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
            .to_string()
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        folder: &str,
    ) -> Result<MediaUpload, MediaError> {
        let timestamp = Self::unix_timestamp();
        let signature = self.sign(&[
            ("folder", folder),
            ("signature_algorithm", "sha256"),
            ("timestamp", &timestamp),
        ]);

        let file_part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected(format!("upload failed ({}): {}", status, body)));
        }

        let uploaded: UploadResponse = response.json().await?;
        Ok(MediaUpload {
            public_id: uploaded.public_id,
            secure_url: uploaded.secure_url,
            bytes: uploaded.bytes,
            width: uploaded.width,
            height: uploaded.height,
        })
    }

    async fn delete_image(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = Self::unix_timestamp();
        let signature = self.sign(&[
            ("public_id", public_id),
            ("signature_algorithm", "sha256"),
            ("timestamp", &timestamp),
        ]);

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("api_key", &self.api_key),
                ("timestamp", &timestamp),
                ("signature_algorithm", "sha256"),
                ("signature", &signature),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected(format!("destroy failed ({}): {}", status, body)));
        }

        let destroyed: DestroyResponse = response.json().await?;
        // "not found" still counts as deleted from our side
        match destroyed.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Rejected(format!("destroy returned {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudinaryClient {
        CloudinaryClient::new(&MediaConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: "zero-code-platform".to_string(),
        })
    }

    #[test]
    fn signature_is_deterministic_and_sorted() {
        let c = client();
        let a = c.sign(&[("timestamp", "100"), ("folder", "f")]);
        let b = c.sign(&[("folder", "f"), ("timestamp", "100")]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // sha256 hex
    }

    #[test]
    fn endpoints_target_the_image_resource() {
        let c = client();
        assert_eq!(
            c.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            c.endpoint("destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }
}
