// SPDX-License-Identifier: AGPL-3.0
// Snapsync Core - Local user identity
//
// The backend keys everything on an anonymous user id generated on this
// device. The id is created lazily and persisted to a local JSON file;
// storage failures degrade to a fresh id instead of an error.

use crate::types::AppError;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// Persisted anonymous user id, generated on first use
pub struct IdentityStore {
    user_id: RwLock<Option<String>>,
    file_path: PathBuf,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct IdentityFile {
    user_id: String,
}

impl IdentityStore {
    /// Create a new identity store, loading from disk if available
    pub fn new() -> Result<Self, AppError> {
        Ok(Self::with_path(Self::get_identity_path()?))
    }

    /// Create an identity store backed by an explicit file path
    pub fn with_path(file_path: PathBuf) -> Self {
        let user_id = if file_path.exists() {
            match fs::read_to_string(&file_path) {
                Ok(content) => match serde_json::from_str::<IdentityFile>(&content) {
                    Ok(file) => Some(file.user_id),
                    Err(e) => {
                        tracing::warn!("Failed to parse identity file, regenerating: {}", e);
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read identity file, regenerating: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            user_id: RwLock::new(user_id),
            file_path,
        }
    }

    /// Get the path to the identity file
    fn get_identity_path() -> Result<PathBuf, AppError> {
        let config_dir = directories::ProjectDirs::from("com", "snapsync", "snapsync")
            .ok_or_else(|| AppError::FileIo("Could not determine config directory".to_string()))?
            .config_dir()
            .to_path_buf();

        // Ensure the directory exists
        fs::create_dir_all(&config_dir)
            .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;

        Ok(config_dir.join("identity.json"))
    }

    /// Persist the user id to disk
    fn persist(&self, user_id: &str) -> Result<(), AppError> {
        let file = IdentityFile {
            user_id: user_id.to_string(),
        };

        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize identity: {}", e)))?;

        fs::write(&self.file_path, content)
            .map_err(|e| AppError::FileIo(format!("Failed to write identity: {}", e)))?;

        Ok(())
    }

    /// Get the persisted user id, generating and persisting one if absent.
    ///
    /// Fails open: if the id cannot be persisted, a freshly generated id is
    /// returned and the cache is dropped, so the id may differ between calls
    /// while storage is unavailable.
    pub fn user_id(&self) -> String {
        if let Some(id) = self.user_id.read().unwrap().clone() {
            return id;
        }

        let id = uuid::Uuid::new_v4().to_string();
        *self.user_id.write().unwrap() = Some(id.clone());

        if let Err(e) = self.persist(&id) {
            tracing::warn!("Failed to persist user id, using a transient one: {}", e);
            *self.user_id.write().unwrap() = None;
        }

        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_uuid_v4() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::with_path(dir.path().join("identity.json"));
        let id = store.user_id();
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_id_is_stable_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::with_path(dir.path().join("identity.json"));
        assert_eq!(store.user_id(), store.user_id());
    }

    #[test]
    fn test_id_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");

        let first = IdentityStore::with_path(path.clone()).user_id();
        let second = IdentityStore::with_path(path).user_id();
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_file_regenerates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        fs::write(&path, "not json").unwrap();

        let store = IdentityStore::with_path(path.clone());
        let id = store.user_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());

        // The regenerated id replaced the corrupt file
        let reloaded = IdentityStore::with_path(path);
        assert_eq!(reloaded.user_id(), id);
    }

    #[test]
    fn test_fails_open_when_unwritable() {
        // Parent directory does not exist, so persist fails
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("identity.json");

        let store = IdentityStore::with_path(path);
        let id = store.user_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
