use crate::models::{Snippet, Tag, UserCollection};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const STORE_FILE: &str = "store.json";
const BACKUP_DIR: &str = "backups";

/// Everything the record store keeps across sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub snippets: Vec<Snippet>,
    #[serde(default)]
    pub collections: Vec<UserCollection>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Where the record store loads from and saves to.
pub trait Persistence: Debug + Send {
    fn load(&self) -> Result<StoreSnapshot>;
    fn save(&self, snapshot: &StoreSnapshot) -> Result<()>;
}

/// JSON file on disk under the data directory
#[derive(Debug)]
pub struct JsonFileStorage {
    data_dir: PathBuf,
    store_file: PathBuf,
}

impl JsonFileStorage {
    /// Opens storage in `<data_dir>/snippy`, creating the directory if needed.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let data_dir = data_dir.join("snippy");
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        Ok(Self {
            store_file: data_dir.join(STORE_FILE),
            data_dir,
        })
    }

    /// Copies the store file into `backups/` under a timestamped name
    pub fn backup(&self) -> Result<PathBuf> {
        let backup_dir = self.data_dir.join(BACKUP_DIR);
        fs::create_dir_all(&backup_dir)?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_file = backup_dir.join(format!("store_{}.json", timestamp));

        if self.store_file.exists() {
            fs::copy(&self.store_file, &backup_file).context("Failed to copy store file")?;
        } else {
            let empty = serde_json::to_string_pretty(&StoreSnapshot::default())?;
            fs::write(&backup_file, empty)?;
        }

        Ok(backup_file)
    }

    pub fn data_directory(&self) -> &Path {
        &self.data_dir
    }

    pub fn store_file(&self) -> &Path {
        &self.store_file
    }
}

impl Persistence for JsonFileStorage {
    fn load(&self) -> Result<StoreSnapshot> {
        if !self.store_file.exists() {
            return Ok(StoreSnapshot::default());
        }

        let content =
            fs::read_to_string(&self.store_file).context("Failed to read store file")?;

        serde_json::from_str(&content).context("Failed to parse store JSON")
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let content =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize store")?;

        let tmp_file = self.store_file.with_extension("json.tmp");
        fs::write(&tmp_file, content).context("Failed to write store file")?;
        fs::rename(&tmp_file, &self.store_file).context("Failed to replace store file")
    }
}

/// In-memory persistence. Clones share the same slot, so a test can keep a
/// handle and inspect what the store flushed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<StoreSnapshot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        match self.slot.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Persistence for MemoryStorage {
    fn load(&self) -> Result<StoreSnapshot> {
        Ok(self.snapshot())
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        *guard = snapshot.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewSnippet, SnippetLanguage};

    #[test]
    fn missing_file_loads_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path()).unwrap();
        assert_eq!(storage.load().unwrap(), StoreSnapshot::default());
    }

    #[test]
    fn json_storage_persists_snippets() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path()).unwrap();

        let snapshot = StoreSnapshot {
            snippets: vec![Snippet::create(
                "guest",
                NewSnippet::new("hello", "println!()", SnippetLanguage::Rust),
            )],
            ..StoreSnapshot::default()
        };
        storage.save(&snapshot).unwrap();

        let reopened = JsonFileStorage::new(dir.path()).unwrap();
        assert_eq!(reopened.load().unwrap(), snapshot);
        assert!(!reopened.store_file().with_extension("json.tmp").exists());
    }

    #[test]
    fn backup_copies_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path()).unwrap();
        storage.save(&StoreSnapshot::default()).unwrap();

        let backup = storage.backup().unwrap();
        assert!(backup.exists());
        assert!(backup.starts_with(storage.data_directory()));
    }

    #[test]
    fn memory_storage_clones_share_state() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        let snapshot = StoreSnapshot {
            snippets: vec![Snippet::create("guest", NewSnippet::default())],
            ..StoreSnapshot::default()
        };
        storage.save(&snapshot).unwrap();
        assert_eq!(handle.snapshot().snippets.len(), 1);
    }
}
