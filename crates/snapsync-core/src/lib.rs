// SPDX-License-Identifier: AGPL-3.0
// Snapsync Core - Shared photo sync logic for all frontends
//
// This crate provides:
// - Photo, AppSettings and AppError types
// - SettingsStore for persistent settings
// - IdentityStore for the anonymous user id
// - UploadLedger for tracking uploaded photos
// - ApiClient for the photo backend (upload + search)
// - FsMediaSource for paginated library enumeration
// - GalleryEngine reconciling all of the above into one displayed list
//
// Frontend-specific code lives in separate crates.

pub mod client;
pub mod gallery;
pub mod identity;
pub mod media;
pub mod settings;
pub mod types;
pub mod uploads;

// Re-export commonly used items
pub use client::{ApiClient, RemoteGallery};
pub use gallery::GalleryEngine;
pub use identity::IdentityStore;
pub use media::{FsMediaSource, MediaSource};
pub use settings::SettingsStore;
pub use types::{
    AppError, AppSettings, BatchOutcome, Cursor, GalleryEvent, Photo, PhotoPage,
};
pub use uploads::UploadLedger;
