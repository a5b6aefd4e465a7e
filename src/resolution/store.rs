//! File-backed resolution cache
//!
//! The backing file is a JSON array of `{"error", "resolution"}` records and is
//! always read and replaced whole:
//! - reads never fail; a missing or malformed file is an empty store
//! - writes go to a sibling temp file which is then renamed over the original
//! - every mutation is serialized through one async mutex

use crate::resolution::model::{ErrorKey, Resolution, ResolutionEntry};
use crate::utils::AppError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Store operation result type
pub type StoreResult<T> = Result<T, AppError>;

/// Record layout used by the first knowledge base files:
/// `{"<error>": {"steps": ["..."]}}`
#[derive(Debug, Deserialize)]
struct LegacyRecord {
    steps: Vec<String>,
}

/// Durable key → resolution cache
pub struct ResolutionStore {
    /// Backing JSON file
    path: PathBuf,
    /// Single-writer lock for save/upsert
    write_lock: Mutex<()>,
}

impl ResolutionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!(path = %path.display(), "Resolution store initialized");
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every entry. Missing or unreadable data yields an empty list.
    pub fn load(&self) -> Vec<ResolutionEntry> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Resolution store does not exist yet");
            return Vec::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "Failed to read resolution store, treating as empty");
                return Vec::new();
            }
        };

        if content.trim().is_empty() {
            return Vec::new();
        }

        if let Ok(entries) = serde_json::from_str::<Vec<ResolutionEntry>>(&content) {
            return entries;
        }

        match serde_json::from_str::<BTreeMap<String, LegacyRecord>>(&content) {
            Ok(legacy) => {
                info!(entries = legacy.len(), "Loaded legacy knowledge base format");
                legacy
                    .into_iter()
                    .map(|(error, record)| ResolutionEntry {
                        error: error.trim().to_lowercase(),
                        resolution: Resolution::Steps(record.steps),
                    })
                    .collect()
            }
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "Malformed resolution store, treating as empty");
                Vec::new()
            }
        }
    }

    /// Case-insensitive lookup
    pub fn find(&self, key: &ErrorKey) -> Option<Resolution> {
        self.load()
            .into_iter()
            .find(|entry| key.matches(&entry.error))
            .map(|entry| entry.resolution)
    }

    /// Atomically replace the persisted set with `entries`
    pub async fn save(&self, entries: &[ResolutionEntry]) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_entries(entries)
    }

    /// Insert or replace the resolution for `key`
    pub async fn upsert(&self, key: &ErrorKey, resolution: Resolution) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load();
        match entries.iter_mut().find(|entry| key.matches(&entry.error)) {
            Some(entry) => {
                debug!(error_key = %key, "Replacing cached resolution");
                entry.resolution = resolution;
            }
            None => {
                debug!(error_key = %key, "Appending new cached resolution");
                entries.push(ResolutionEntry::new(key, resolution));
            }
        }

        self.write_entries(&entries)
    }

    /// Write to a temp file next to the store, then rename it into place.
    /// Caller holds the write lock.
    fn write_entries(&self, entries: &[ResolutionEntry]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                error!(error = %e, dir = %parent.display(), "Failed to create store directory");
                AppError::InternalError(format!("Failed to create store directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(entries).map_err(|e| {
            error!(error = %e, "Failed to serialize resolution store");
            AppError::InternalError(format!("Failed to serialize resolution store: {}", e))
        })?;

        let tmp_path = self.temp_path();
        let write_result = File::create(&tmp_path).and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        });

        if let Err(e) = write_result {
            error!(error = %e, path = %tmp_path.display(), "Failed to write temp store file");
            let _ = fs::remove_file(&tmp_path);
            return Err(AppError::InternalError(format!(
                "Failed to write resolution store: {}",
                e
            )));
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            error!(error = %e, path = %self.path.display(), "Failed to move temp store file into place");
            let _ = fs::remove_file(&tmp_path);
            AppError::InternalError(format!("Failed to replace resolution store: {}", e))
        })?;

        debug!(entries = entries.len(), path = %self.path.display(), "Resolution store saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "resolutions.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
