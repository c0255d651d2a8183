//! File-backed cooldown persistence.
//!
//! The timestamp lives in a small JSON key-value file, by default
//! `~/.config/hairline-scan/state.json` (macOS:
//! `~/Library/Application Support/hairline-scan/state.json`):
//!
//! ```json
//! { "hairline_last_analysis_at": 1767225600000 }
//! ```
//!
//! Other keys in the file are preserved on write.

use super::{CooldownStore, COOLDOWN_KEY};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize state: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

pub struct FileCooldownStore {
    path: Option<PathBuf>,
}

impl FileCooldownStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store at `<config_dir>/hairline-scan/state.json`. If the platform has
    /// no config dir the store is permanently unavailable (reads → None).
    pub fn default_location() -> Self {
        Self {
            path: dirs::config_dir().map(|c| c.join("hairline-scan").join("state.json")),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load_map(&self) -> Result<HashMap<String, Value>, StoreError> {
        let path = self.path.as_ref().ok_or(StoreError::NoConfigDir)?;
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn try_read(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.load_map()?.get(COOLDOWN_KEY).and_then(Value::as_u64))
    }

    fn try_write(&self, timestamp_ms: u64) -> Result<(), StoreError> {
        let path = self.path.as_ref().ok_or(StoreError::NoConfigDir)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        // A corrupt file is replaced rather than blocking every future write.
        let mut map = self.load_map().unwrap_or_default();
        map.insert(COOLDOWN_KEY.to_string(), Value::from(timestamp_ms));
        let json = serde_json::to_string_pretty(&map)?;
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }
}

impl CooldownStore for FileCooldownStore {
    fn read(&self) -> Option<u64> {
        match self.try_read() {
            Ok(ts) => ts,
            Err(e) => {
                log::warn!("[COOLDOWN] Read failed, treating as no prior analysis: {}", e);
                None
            }
        }
    }

    fn write(&self, timestamp_ms: u64) {
        match self.try_write(timestamp_ms) {
            Ok(()) => log::debug!("[COOLDOWN] Recorded analysis start at {}", timestamp_ms),
            Err(e) => log::warn!("[COOLDOWN] Write failed, cooldown not persisted: {}", e),
        }
    }
}
