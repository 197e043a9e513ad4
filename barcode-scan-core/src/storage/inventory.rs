use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::scan_result::ScannedItem;

/// Storage key of the scanned item list.
pub const INVENTORY_KEY: &str = "inventoryItems";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("failed to serialize items: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Directory-backed key/value store holding the item list as one JSON
/// array under [`INVENTORY_KEY`].
///
/// ```text
/// {dir}/inventoryItems.json   [{"id": ..., "fullBarcode": ..., ...}, ...]
/// ```
#[derive(Debug, Clone)]
pub struct InventoryStore {
    dir: PathBuf,
}

impl InventoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", INVENTORY_KEY))
    }

    /// Load every stored item. A store that was never written is empty.
    pub fn load_items(&self) -> Result<Vec<ScannedItem>, StorageError> {
        let path = self.path();
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StorageError::Read { path, source }),
        };
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&json).map_err(|source| StorageError::Parse { path, source })
    }

    /// Replace the stored list with `items`.
    pub fn save_items(&self, items: &[ScannedItem]) -> Result<(), StorageError> {
        let path = self.path();
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Write {
            path: self.dir.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(items)?;

        // Write next to the target and rename, so a crash never leaves half an array.
        let staging = staging_path(&path);
        fs::write(&staging, json).map_err(|source| StorageError::Write {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| StorageError::Write { path, source })?;
        Ok(())
    }

    /// Append one item and return the new item count.
    pub fn append_item(&self, item: ScannedItem) -> Result<usize, StorageError> {
        let mut items = self.load_items()?;
        items.push(item);
        self.save_items(&items)?;
        log::debug!("Stored item, {} item(s) in {}", items.len(), self.path().display());
        Ok(items.len())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}
