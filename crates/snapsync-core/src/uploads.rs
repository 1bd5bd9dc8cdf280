// SPDX-License-Identifier: AGPL-3.0
// Snapsync Core - Uploaded-photo ledger
//
// Tracks which photo uris have been confirmed uploaded, in a local JSON
// file. The set only grows and is deduplicated on every write.

use crate::types::AppError;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// File-based ledger of uploaded photo uris
pub struct UploadLedger {
    uris: RwLock<Vec<String>>,
    file_path: PathBuf,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct LedgerFile {
    uris: Vec<String>,
}

impl UploadLedger {
    /// Create a new ledger, loading from disk if available
    pub fn new() -> Result<Self, AppError> {
        Ok(Self::with_path(Self::get_ledger_path()?))
    }

    /// Create a ledger backed by an explicit file path
    pub fn with_path(file_path: PathBuf) -> Self {
        let uris = if file_path.exists() {
            match fs::read_to_string(&file_path) {
                Ok(content) => serde_json::from_str::<LedgerFile>(&content)
                    .map(|file| file.uris)
                    .unwrap_or_else(|e| {
                        tracing::warn!("Failed to parse upload ledger, starting fresh: {}", e);
                        Vec::new()
                    }),
                Err(e) => {
                    tracing::warn!("Failed to read upload ledger, starting fresh: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Self {
            uris: RwLock::new(uris),
            file_path,
        }
    }

    /// Get the path to the ledger file
    fn get_ledger_path() -> Result<PathBuf, AppError> {
        let config_dir = directories::ProjectDirs::from("com", "snapsync", "snapsync")
            .ok_or_else(|| AppError::FileIo("Could not determine config directory".to_string()))?
            .config_dir()
            .to_path_buf();

        // Ensure the directory exists
        fs::create_dir_all(&config_dir)
            .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;

        Ok(config_dir.join("uploaded.json"))
    }

    /// Persist the ledger to disk
    fn persist(&self) -> Result<(), AppError> {
        let uris = self.uris.read().unwrap();
        let file = LedgerFile { uris: uris.clone() };

        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize ledger: {}", e)))?;

        fs::write(&self.file_path, content)
            .map_err(|e| AppError::FileIo(format!("Failed to write ledger: {}", e)))?;

        Ok(())
    }

    /// All uploaded uris in first-recorded order, empty on any read error
    pub fn list(&self) -> Vec<String> {
        self.uris.read().unwrap().clone()
    }

    /// Whether a uri has been recorded as uploaded
    pub fn contains(&self, uri: &str) -> bool {
        self.uris.read().unwrap().iter().any(|u| u == uri)
    }

    /// Union the given uris into the ledger and persist.
    ///
    /// Returns the full deduplicated set on success. On a persistence
    /// failure the returned sequence is empty, which callers must read as
    /// "state unknown" rather than "set cleared"; the in-memory set keeps
    /// the union either way.
    pub fn record(&self, new_uris: &[String]) -> Vec<String> {
        {
            let mut uris = self.uris.write().unwrap();
            for uri in new_uris {
                if !uris.contains(uri) {
                    uris.push(uri.clone());
                }
            }
        }

        match self.persist() {
            Ok(()) => self.list(),
            Err(e) => {
                tracing::warn!("Failed to persist upload ledger: {}", e);
                Vec::new()
            }
        }
    }

    /// Count of recorded uris
    pub fn count(&self) -> usize {
        self.uris.read().unwrap().len()
    }
}
