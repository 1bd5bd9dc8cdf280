// SPDX-License-Identifier: AGPL-3.0
// Snapsync Core - Type definitions

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single photo in the local library.
///
/// Immutable once fetched. The filesystem media source uses the canonical
/// file path for both `id` and `uri`; a platform media store would supply a
/// distinct stable asset id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub uri: String,
}

impl Photo {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
        }
    }
}

/// One page of photos from a media source.
#[derive(Debug, Clone, Default)]
pub struct PhotoPage {
    pub photos: Vec<Photo>,
    /// Opaque token for fetching the page after this one.
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
}

impl PhotoPage {
    /// The terminal page: no photos, no continuation.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Keyset pagination cursor over a (taken_at, uri) sort key.
///
/// Encoded as base64 JSON so consumers only ever see an opaque token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub taken_at: DateTime<Utc>,
    pub uri: String,
}

impl Cursor {
    pub fn encode(&self) -> String {
        // Serializing a struct of (DateTime, String) cannot fail
        let json = serde_json::to_string(self).expect("cursor serialization");
        BASE64.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self, AppError> {
        let bytes = BASE64
            .decode(token)
            .map_err(|e| AppError::InvalidCursor(format!("Not base64: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::InvalidCursor(format!("Malformed cursor: {}", e)))
    }
}

/// Application settings (frontend-agnostic)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Base URL of the photo backend
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Directory scanned for photos
    pub library_dir: PathBuf,
    /// Number of photos requested on the initial load
    #[serde(default = "default_initial_page_size")]
    pub initial_page_size: usize,
    /// Number of photos requested per load-more fetch
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Theme preference: "dark", "light", or "system"
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_server_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_initial_page_size() -> usize {
    100
}

fn default_page_size() -> usize {
    50
}

fn default_theme() -> String {
    "system".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        let library_dir = directories::UserDirs::new()
            .and_then(|d| d.picture_dir().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            server_url: default_server_url(),
            library_dir,
            initial_page_size: default_initial_page_size(),
            page_size: default_page_size(),
            theme: default_theme(),
        }
    }
}

/// Summary of an upload batch.
///
/// `attempted` counts photos after the already-uploaded filter; a selection
/// that filters down to nothing is `NothingToDo`, not an empty success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    NothingToDo,
    AllSucceeded(usize),
    Partial { succeeded: usize, attempted: usize },
    AllFailed(usize),
}

impl BatchOutcome {
    /// Classify a finished batch from its fold result.
    pub fn classify(succeeded: usize, attempted: usize) -> Self {
        if attempted == 0 {
            Self::NothingToDo
        } else if succeeded == attempted {
            Self::AllSucceeded(attempted)
        } else if succeeded == 0 {
            Self::AllFailed(attempted)
        } else {
            Self::Partial {
                succeeded,
                attempted,
            }
        }
    }
}

impl std::fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingToDo => write!(f, "All selected photos are already uploaded"),
            Self::AllSucceeded(1) => write!(f, "Photo uploaded successfully"),
            Self::AllSucceeded(n) => write!(f, "All {} photos uploaded successfully", n),
            Self::Partial {
                succeeded,
                attempted,
            } => write!(
                f,
                "Uploaded {} of {} photos, some uploads failed",
                succeeded, attempted
            ),
            Self::AllFailed(_) => write!(f, "Could not upload any photos"),
        }
    }
}

/// Progress events emitted by the gallery engine during an upload batch
#[derive(Debug, Clone)]
pub enum GalleryEvent {
    UploadStarted {
        total: usize,
    },
    UploadProgress {
        /// Items attempted so far (success or failure)
        attempted: usize,
        /// Items confirmed uploaded so far
        succeeded: usize,
        total: usize,
    },
    UploadFinished {
        outcome: BatchOutcome,
    },
}

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upload failed with status {status}: {body}")]
    Upload { status: u16, body: String },

    #[error("Search failed with status {status}: {body}")]
    Search { status: u16, body: String },

    #[error("Media access denied: {0}")]
    PermissionDenied(String),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            AppError::PermissionDenied(err.to_string())
        } else {
            AppError::FileIo(err.to_string())
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}
