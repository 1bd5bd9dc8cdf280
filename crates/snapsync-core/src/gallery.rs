// SPDX-License-Identifier: AGPL-3.0
// Snapsync Core - Gallery reconciliation engine
//
// Merges paginated library fetches, remote search filters, and per-photo
// upload state into the one list a frontend displays. All mutable state is
// owned here and mutated only when an async operation completes; uploads
// within a batch run strictly one at a time so progress counts stay
// deterministic and a failed item cannot corrupt in-flight state.

use crate::client::RemoteGallery;
use crate::media::MediaSource;
use crate::types::{AppError, AppSettings, BatchOutcome, GalleryEvent, Photo, PhotoPage};
use crate::uploads::UploadLedger;
use async_channel::{Receiver, Sender};
use std::collections::HashSet;
use std::sync::Arc;

/// Gallery state machine over the local library, remote search, and the
/// upload ledger
pub struct GalleryEngine {
    media: Arc<dyn MediaSource>,
    remote: Arc<dyn RemoteGallery>,
    ledger: Arc<UploadLedger>,

    all_photos: Vec<Photo>,
    cursor: Option<String>,
    has_next_page: bool,
    /// Uri set from the last non-empty search reconciliation
    active_filter: Option<HashSet<String>>,
    /// Photos marked for upload, in selection order. Never persisted.
    selection: Vec<Photo>,
    /// Cache of the ledger's uploaded uris
    uploaded: Vec<String>,

    loading: bool,
    loading_more: bool,
    uploading: bool,

    initial_page_size: usize,
    page_size: usize,
    events: Option<Sender<GalleryEvent>>,
}

impl GalleryEngine {
    pub fn new(
        media: Arc<dyn MediaSource>,
        remote: Arc<dyn RemoteGallery>,
        ledger: Arc<UploadLedger>,
        settings: &AppSettings,
    ) -> Self {
        Self {
            media,
            remote,
            ledger,
            all_photos: Vec::new(),
            cursor: None,
            has_next_page: true,
            active_filter: None,
            selection: Vec::new(),
            uploaded: Vec::new(),
            loading: false,
            loading_more: false,
            uploading: false,
            initial_page_size: settings.initial_page_size,
            page_size: settings.page_size,
            events: None,
        }
    }

    /// Like `new`, but upload progress is reported on the returned channel
    pub fn with_channel_events(
        media: Arc<dyn MediaSource>,
        remote: Arc<dyn RemoteGallery>,
        ledger: Arc<UploadLedger>,
        settings: &AppSettings,
    ) -> (Self, Receiver<GalleryEvent>) {
        let (event_tx, event_rx) = async_channel::bounded(64);
        let mut engine = Self::new(media, remote, ledger, settings);
        engine.events = Some(event_tx);
        (engine, event_rx)
    }

    /// Load the first page of the library and refresh the uploaded cache
    pub async fn initial_load(&mut self) {
        self.loading = true;
        let page = self.media.fetch_photos(None, self.initial_page_size).await;
        self.all_photos = page.photos;
        self.cursor = page.next_cursor;
        self.has_next_page = page.has_next_page;
        self.uploaded = self.ledger.list();
        self.loading = false;
    }

    /// Fetch and append the next page.
    ///
    /// Returns whether a fetch was issued. Suppressed (without touching the
    /// media source) when there is no next page, a fetch is already in
    /// flight, or a search filter is active.
    pub async fn load_more(&mut self) -> bool {
        if !self.has_next_page
            || self.loading_more
            || self.loading
            || self.active_filter.is_some()
        {
            return false;
        }

        self.loading_more = true;
        let page = self.media.fetch_photos(self.cursor.as_deref(), self.page_size).await;
        self.append_page(page);
        self.loading_more = false;
        true
    }

    /// Append a fetched page, preserving fetch order.
    ///
    /// No re-sort and no dedup by id: the media source is trusted not to
    /// return duplicates across the pages of a session.
    pub fn append_page(&mut self, page: PhotoPage) {
        self.all_photos.extend(page.photos);
        self.cursor = page.next_cursor;
        self.has_next_page = page.has_next_page;
    }

    /// The photos to display: the full list, or the search-filtered view in
    /// original fetch order
    pub fn displayed(&self) -> Vec<Photo> {
        match &self.active_filter {
            Some(filter) => self
                .all_photos
                .iter()
                .filter(|photo| filter.contains(&photo.uri))
                .cloned()
                .collect(),
            None => self.all_photos.clone(),
        }
    }

    /// Run a remote search and reconcile the result against the local
    /// library. Returns the number of local photos matched.
    ///
    /// A blank query clears the filter without a network call. An empty
    /// match set also leaves the gallery unfiltered. A search failure
    /// clears the filter and surfaces the error.
    pub async fn search(&mut self, query: &str) -> Result<usize, AppError> {
        if query.trim().is_empty() {
            self.active_filter = None;
            return Ok(0);
        }

        self.loading = true;
        let result = self.remote.search_photos(query).await;
        self.loading = false;

        let filenames = match result {
            Ok(filenames) => filenames,
            Err(e) => {
                tracing::error!("Search failed: {}", e);
                self.active_filter = None;
                return Err(e);
            }
        };

        // Heuristic join: a local uri matches a remote filename when it ends
        // with the filename's final path segment. Two local photos sharing a
        // trailing filename both match; that ambiguity is kept as-is.
        let matched: HashSet<String> = self
            .all_photos
            .iter()
            .filter(|photo| {
                filenames
                    .iter()
                    .any(|name| Self::uri_matches(&photo.uri, name))
            })
            .map(|photo| photo.uri.clone())
            .collect();

        let count = matched.len();
        self.active_filter = if matched.is_empty() {
            None
        } else {
            Some(matched)
        };
        Ok(count)
    }

    fn uri_matches(uri: &str, filename: &str) -> bool {
        let segment = filename.rsplit('/').next().unwrap_or(filename);
        uri.ends_with(segment)
    }

    /// Toggle a photo in the selection. Already-uploaded photos are never
    /// selectable.
    pub fn toggle_select(&mut self, photo: &Photo) {
        if self.is_uploaded(&photo.uri) {
            return;
        }

        if let Some(pos) = self.selection.iter().position(|p| p.id == photo.id) {
            self.selection.remove(pos);
        } else {
            self.selection.push(photo.clone());
        }
    }

    /// Select every displayed photo that is not yet uploaded; if they are
    /// all selected already, clear the selection instead
    pub fn select_all_displayed(&mut self) {
        let selectable: Vec<Photo> = self
            .displayed()
            .into_iter()
            .filter(|photo| !self.is_uploaded(&photo.uri))
            .collect();

        if self.selection.len() == selectable.len() {
            self.selection.clear();
        } else {
            self.selection = selectable;
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Upload the current selection sequentially, in selection order.
    ///
    /// Photos already in the uploaded set are filtered out first; if nothing
    /// remains the batch short-circuits as `NothingToDo` without touching
    /// the network. A per-item failure is logged and the batch continues.
    /// Successful uris are recorded in the ledger afterwards. There is no
    /// mid-batch cancellation.
    pub async fn upload_selected(&mut self) -> BatchOutcome {
        let to_upload: Vec<Photo> = self
            .selection
            .iter()
            .filter(|photo| !self.is_uploaded(&photo.uri))
            .cloned()
            .collect();

        if to_upload.is_empty() {
            return BatchOutcome::NothingToDo;
        }

        self.selection.clear();
        self.uploading = true;

        let total = to_upload.len();
        self.emit(GalleryEvent::UploadStarted { total }).await;

        let mut results: Vec<Result<String, AppError>> = Vec::with_capacity(total);
        for (index, photo) in to_upload.iter().enumerate() {
            let result = self
                .remote
                .upload_image(&photo.uri)
                .await
                .map(|_| photo.uri.clone());

            if let Err(e) = &result {
                tracing::error!("Failed to upload {}: {}", photo.uri, e);
            }

            results.push(result);
            self.emit(GalleryEvent::UploadProgress {
                attempted: index + 1,
                succeeded: results.iter().filter(|r| r.is_ok()).count(),
                total,
            })
            .await;
        }

        let succeeded: Vec<String> = results
            .into_iter()
            .filter_map(|result| result.ok())
            .collect();

        if !succeeded.is_empty() {
            // record() returns empty on a persistence failure ("state
            // unknown"), so refresh from the ledger's view instead
            self.ledger.record(&succeeded);
            self.uploaded = self.ledger.list();
        }

        let outcome = BatchOutcome::classify(succeeded.len(), total);
        self.uploading = false;
        self.emit(GalleryEvent::UploadFinished {
            outcome: outcome.clone(),
        })
        .await;

        outcome
    }

    async fn emit(&self, event: GalleryEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event).await;
        }
    }

    pub fn all_photos(&self) -> &[Photo] {
        &self.all_photos
    }

    pub fn selection(&self) -> &[Photo] {
        &self.selection
    }

    pub fn uploaded(&self) -> &[String] {
        &self.uploaded
    }

    pub fn is_uploaded(&self, uri: &str) -> bool {
        self.uploaded.iter().any(|u| u == uri)
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn is_filtered(&self) -> bool {
        self.active_filter.is_some()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }
}
