//! Flat key-value persistence for gasmon dashboard state.
//!
//! [`KvStore`] is the storage seam: string keys, string values, last write
//! wins. [`JsonFileStore`] keeps the map in memory and snapshots it to a JSON
//! file on every write; [`MemoryStore`] never touches disk.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A string key-value store.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> std::io::Result<()>;
}

// ─── JSON file store ──────────────────────────────────────────────────────────

/// Snapshots to `{state_path}/state/{domain}.json` on every write.
pub struct JsonFileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl JsonFileStore {
    /// Open the store for `domain` under `state_path`, loading any existing
    /// snapshot. A missing or corrupt file starts empty.
    pub fn open(state_path: &Path, domain: &str) -> Self {
        let path = state_path.join("state").join(format!("{domain}.json"));
        let entries = Self::load(&path);
        debug!(path = %path.display(), count = entries.len(), "opened key-value store");
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> HashMap<String, String> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "corrupt state file, starting fresh");
                HashMap::new()
            }),
            Err(_) => {
                debug!(path = %path.display(), "no state file, starting fresh");
                HashMap::new()
            }
        }
    }

    fn snapshot(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, content)
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> std::io::Result<()> {
        self.entries.insert(key.to_string(), value);
        self.snapshot()
    }
}

// ─── Memory store ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> std::io::Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
