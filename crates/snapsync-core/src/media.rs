// SPDX-License-Identifier: AGPL-3.0
// Snapsync Core - Photo source adapter
//
// Paginated enumeration of the local photo library. Errors never surface
// through fetch_photos: a failed scan degrades to an empty terminal page,
// matching how a denied media permission presents on device. Callers that
// need to tell "no photos" from "no access" use probe().

use crate::types::{AppError, Cursor, Photo, PhotoPage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Extensions treated as photos when scanning the library
const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "bmp", "tiff",
];

/// A paginated source of photos
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fetch one page of photos.
    ///
    /// `cursor` is the opaque token from the previous page, or `None` for
    /// the first page. Ordering is stable within a paging session. Returns
    /// the empty terminal page on any access failure.
    async fn fetch_photos(&self, cursor: Option<&str>, limit: usize) -> PhotoPage;
}

/// Media source backed by a flat directory of image files
pub struct FsMediaSource {
    library_dir: PathBuf,
}

impl FsMediaSource {
    pub fn new(library_dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: library_dir.into(),
        }
    }

    /// Check that the library is accessible at all.
    ///
    /// fetch_photos deliberately collapses "no access" into an empty page;
    /// this is the independent permission check for callers that care.
    pub async fn probe(&self) -> Result<(), AppError> {
        tokio::fs::read_dir(&self.library_dir)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    fn is_photo(path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| PHOTO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Scan the library, sorted by creation time then path.
    ///
    /// The deterministic sort key is what keeps ordering stable across the
    /// pages of one session and lets the keyset cursor resume correctly.
    async fn scan(&self) -> Result<Vec<(DateTime<Utc>, Photo)>, AppError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.library_dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if !Self::is_photo(&path) {
                continue;
            }

            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let taken_at = metadata
                .created()
                .or_else(|_| metadata.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH);

            let uri = path.to_string_lossy().into_owned();
            entries.push((taken_at, Photo::new(uri.clone(), uri)));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.uri.cmp(&b.1.uri)));
        Ok(entries)
    }
}

#[async_trait]
impl MediaSource for FsMediaSource {
    async fn fetch_photos(&self, cursor: Option<&str>, limit: usize) -> PhotoPage {
        let entries = match self.scan().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Library scan failed: {}", e);
                return PhotoPage::empty();
            }
        };

        let start = match cursor {
            None => 0,
            Some(token) => match Cursor::decode(token) {
                Ok(key) => entries
                    .iter()
                    .position(|(taken_at, photo)| {
                        (*taken_at, photo.uri.as_str()) > (key.taken_at, key.uri.as_str())
                    })
                    .unwrap_or(entries.len()),
                Err(e) => {
                    tracing::warn!("Ignoring bad page cursor: {}", e);
                    return PhotoPage::empty();
                }
            },
        };

        let end = (start + limit).min(entries.len());
        let has_next_page = end < entries.len();

        let next_cursor = if has_next_page && end > start {
            let (taken_at, photo) = &entries[end - 1];
            Some(
                Cursor {
                    taken_at: *taken_at,
                    uri: photo.uri.clone(),
                }
                .encode(),
            )
        } else {
            None
        };

        PhotoPage {
            photos: entries[start..end]
                .iter()
                .map(|(_, photo)| photo.clone())
                .collect(),
            next_cursor,
            has_next_page,
        }
    }
}
