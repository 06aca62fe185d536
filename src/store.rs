//! Last-Event Persistence
//!
//! Single-key cache of the most recent scan's decoded text. Writes are
//! last-write-wins with no history; the backing file update is best-effort
//! and never fails the caller, so a slow or broken persistence layer cannot
//! stall notification delivery.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Logical key under which the last code is persisted.
pub const LAST_SCAN_KEY: &str = "last_scan_code";

/// On-disk document. Only the decoded code survives a restart; the rest of
/// the canonical event is live-delivery data.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    last_scan_code: String,
}

/// Persistent single-key cache of the most recent scan code.
pub struct LastScanStore {
    path: PathBuf,
    value: RwLock<String>,
}

impl LastScanStore {
    /// Open the store at `path`, reloading any previously persisted value.
    /// A missing or unreadable file starts the store empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let value = load_document(&path).unwrap_or_default();
        if !value.is_empty() {
            debug!("Recovered {} from {}", LAST_SCAN_KEY, path.display());
        }
        Self {
            path,
            value: RwLock::new(value),
        }
    }

    /// Record `code` as the most recent scan. Persistence failures are
    /// logged and swallowed; the in-memory value is always updated.
    pub fn write(&self, code: &str) {
        *self.value.write() = code.to_string();
        if let Err(e) = self.persist(code) {
            warn!(
                "Failed to persist {} to {}: {:#}",
                LAST_SCAN_KEY,
                self.path.display(),
                e
            );
        }
    }

    /// Most recent code, or the empty string when nothing was ever written.
    pub fn read(&self) -> String {
        self.value.read().clone()
    }

    fn persist(&self, code: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
        }
        let document = StoreDocument {
            last_scan_code: code.to_string(),
        };
        let body = serde_json::to_string(&document).context("Failed to serialize store document")?;
        fs::write(&self.path, body)
            .with_context(|| format!("Failed to write store file: {}", self.path.display()))
    }
}

fn load_document(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<StoreDocument>(&content) {
        Ok(document) => Some(document.last_scan_code),
        Err(e) => {
            warn!("Ignoring malformed store file {}: {}", path.display(), e);
            None
        }
    }
}

/// Default backing file under the user data directory.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scanbridge")
        .join("last_scan.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> LastScanStore {
        LastScanStore::open(dir.path().join("last_scan.json"))
    }

    #[test]
    fn test_read_before_any_write_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store_in(&dir).read(), "");
    }

    #[test]
    fn test_write_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.write("4006381333931");
        assert_eq!(store.read(), "4006381333931");
    }

    #[test]
    fn test_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.write("first");
        store.write("second");
        assert_eq!(store.read(), "second");
    }

    #[test]
    fn test_value_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_scan.json");
        LastScanStore::open(&path).write("persisted");

        let reopened = LastScanStore::open(&path);
        assert_eq!(reopened.read(), "persisted");
    }

    #[test]
    fn test_malformed_store_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_scan.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(LastScanStore::open(&path).read(), "");
    }

    #[test]
    fn test_unwritable_path_still_serves_reads() {
        // Persistence is a convenience cache; a broken backing path must
        // not surface to the writer.
        let store = LastScanStore::open("/proc/scanbridge-no-such-dir/last_scan.json");
        store.write("in-memory-only");
        assert_eq!(store.read(), "in-memory-only");
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deep").join("last_scan.json");
        LastScanStore::open(&path).write("nested");
        assert_eq!(LastScanStore::open(&path).read(), "nested");
    }
}
