// SPDX-License-Identifier: AGPL-3.0
// Snapsync Core - Remote API client
//
// Talks to the photo backend: uploads base64-encoded images and runs
// semantic searches. The anonymous user id is resolved through the
// identity store on every request.

use crate::identity::IdentityStore;
use crate::types::AppError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// The remote operations the gallery engine depends on
#[async_trait]
pub trait RemoteGallery: Send + Sync {
    /// Upload the photo at `local_uri`; the response body is opaque
    async fn upload_image(&self, local_uri: &str) -> Result<serde_json::Value, AppError>;

    /// Search uploaded photos; returns the matching remote filenames
    async fn search_photos(&self, query: &str) -> Result<Vec<String>, AppError>;
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    image: String,
    filename: &'a str,
    user_id: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    user_id: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    image_filenames: Vec<String>,
}

/// HTTP client for the photo backend
pub struct ApiClient {
    http_client: Client,
    server_url: String,
    identity: Arc<IdentityStore>,
}

impl ApiClient {
    pub fn new(server_url: impl Into<String>, identity: Arc<IdentityStore>) -> Self {
        let http_client = Client::builder()
            // Large photos over slow links; detect stalls via read_timeout
            .read_timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            identity,
        }
    }

    /// Final path segment of a uri, used as the remote filename
    fn filename_of(uri: &str) -> &str {
        uri.rsplit('/').next().unwrap_or(uri)
    }
}

#[async_trait]
impl RemoteGallery for ApiClient {
    async fn upload_image(&self, local_uri: &str) -> Result<serde_json::Value, AppError> {
        let bytes = tokio::fs::read(local_uri)
            .await
            .map_err(|e| AppError::FileIo(format!("Failed to read {}: {}", local_uri, e)))?;

        let request = UploadRequest {
            image: BASE64.encode(&bytes),
            filename: Self::filename_of(local_uri),
            user_id: self.identity.user_id(),
        };

        let response = self
            .http_client
            .post(format!("{}/upload", self.server_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Upload of {} rejected with {}: {}", local_uri, status, body);
            return Err(AppError::Upload {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    async fn search_photos(&self, query: &str) -> Result<Vec<String>, AppError> {
        let request = SearchRequest {
            query,
            user_id: self.identity.user_id(),
        };

        let response = self
            .http_client
            .post(format!("{}/search", self.server_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Search rejected with {}: {}", status, body);
            return Err(AppError::Search {
                status: status.as_u16(),
                body,
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.image_filenames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_of() {
        assert_eq!(ApiClient::filename_of("/photos/img001.jpg"), "img001.jpg");
        assert_eq!(
            ApiClient::filename_of("file:///a/b/c/shot.png"),
            "shot.png"
        );
        assert_eq!(ApiClient::filename_of("bare.jpg"), "bare.jpg");
    }

    #[test]
    fn test_upload_request_shape() {
        let request = UploadRequest {
            image: "aGk=".to_string(),
            filename: "img001.jpg",
            user_id: "u-1".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["image"], "aGk=");
        assert_eq!(json["filename"], "img001.jpg");
        assert_eq!(json["user_id"], "u-1");
    }

    #[test]
    fn test_search_response_tolerates_missing_field() {
        let body: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(body.image_filenames.is_empty());

        let body: SearchResponse =
            serde_json::from_str(r#"{"image_filenames":["a.jpg","b.jpg"]}"#).unwrap();
        assert_eq!(body.image_filenames, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let identity = Arc::new(IdentityStore::with_path(dir.path().join("identity.json")));
        let client = ApiClient::new("http://localhost:8000/", identity);
        assert_eq!(client.server_url, "http://localhost:8000");
    }
}
