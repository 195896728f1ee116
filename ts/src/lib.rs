//! TaskStore - keyed JSON blob persistence
//!
//! Each key maps to one `{key}.json` file holding a JSON array. Reads of a
//! missing or blank blob yield an empty list; writes always replace the whole
//! blob (no merge, no partial update).
//!
//! # Layout
//!
//! ```text
//! {dir}/
//! ├── plan.json        # the blob for key "plan"
//! └── .plan.json.lock  # advisory lock held during reads and writes
//! ```
//!
//! # Example
//!
//! ```ignore
//! use taskstore::Store;
//!
//! let store = Store::open(".")?;
//! let mut items: Vec<String> = store.load("plan")?;
//! items.push("water the plants".into());
//! store.save("plan", &items)?;
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Key used when the caller has no reason to pick another one
pub const DEFAULT_KEY: &str = "plan";

/// Directory-backed blob store
#[derive(Debug, Clone)]
pub struct Store {
    base_path: PathBuf,
}

impl Store {
    /// Open or create a store rooted at the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        debug!(?base_path, "Store::open: opened");
        Ok(Self { base_path })
    }

    /// Path of the blob backing `key`
    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!(".{}.json.lock", key))
    }

    /// Load every record stored under `key`
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        validate_key(key)?;
        let path = self.blob_path(key);
        debug!(?path, "Store::load: called");

        let _lock = self.lock(key, false)?;

        if !path.exists() {
            debug!("Store::load: blob missing, returning empty");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            debug!("Store::load: blob blank, returning empty");
            return Ok(Vec::new());
        }

        let records: Vec<T> =
            serde_json::from_str(&content).context(format!("Failed to parse {}", path.display()))?;
        debug!(count = records.len(), "Store::load: loaded");
        Ok(records)
    }

    /// Replace the blob under `key` with `records`
    ///
    /// Writes to a sibling temp file and renames it over the blob so readers
    /// never observe a half-written array.
    pub fn save<T: Serialize>(&self, key: &str, records: &[T]) -> Result<()> {
        validate_key(key)?;
        let path = self.blob_path(key);
        debug!(?path, count = records.len(), "Store::save: called");

        let _lock = self.lock(key, true)?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records.serialize(&mut ser).context("Failed to serialize records")?;

        let tmp_path = self.base_path.join(format!(".{}.json.tmp", key));
        {
            let mut tmp = File::create(&tmp_path).context(format!("Failed to create {}", tmp_path.display()))?;
            tmp.write_all(&buf)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &path).context(format!("Failed to replace {}", path.display()))?;

        info!(key, count = records.len(), "Saved records");
        Ok(())
    }

    fn lock(&self, key: &str, exclusive: bool) -> Result<BlobLock> {
        let path = self.lock_path(key);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .context(format!("Failed to open lock file {}", path.display()))?;
        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.context("Failed to acquire store lock")?;
        Ok(BlobLock { file })
    }
}

/// Held for the duration of one read or write
struct BlobLock {
    file: File,
}

impl Drop for BlobLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
        return Err(eyre!("Invalid store key: '{}'", key));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        task: String,
        due_date: String,
    }

    fn item(task: &str, due: &str) -> Item {
        Item {
            task: task.to_string(),
            due_date: due.to_string(),
        }
    }

    #[test]
    fn test_load_missing_blob_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path()).unwrap();
        let items: Vec<Item> = store.load(DEFAULT_KEY).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_load_blank_blob_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path()).unwrap();
        fs::write(store.blob_path("plan"), "  \n\t").unwrap();
        let items: Vec<Item> = store.load("plan").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path()).unwrap();
        let items = vec![
            item("Buy milk", "2025-03-01 10:00:00"),
            item("Call the bank", "Not specified"),
        ];

        store.save("plan", &items).unwrap();
        let loaded: Vec<Item> = store.load("plan").unwrap();
        assert_eq!(loaded, items);
    }

    #[test]
    fn test_save_empty_list_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path()).unwrap();
        store.save::<Item>("plan", &[]).unwrap();
        let loaded: Vec<Item> = store.load("plan").unwrap();
        assert!(loaded.is_empty());
        assert_eq!(fs::read_to_string(store.blob_path("plan")).unwrap(), "[]");
    }

    #[test]
    fn test_save_overwrites_previous_blob() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path()).unwrap();
        store.save("plan", &[item("a", "Not specified"), item("b", "Not specified")]).unwrap();
        store.save("plan", &[item("c", "Not specified")]).unwrap();

        let loaded: Vec<Item> = store.load("plan").unwrap();
        assert_eq!(loaded, vec![item("c", "Not specified")]);
    }

    #[test]
    fn test_save_uses_four_space_indent() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path()).unwrap();
        store.save("plan", &[item("a", "Not specified")]).unwrap();
        let raw = fs::read_to_string(store.blob_path("plan")).unwrap();
        assert!(raw.contains("\n        \"task\": \"a\""));
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path()).unwrap();
        assert!(store.load::<Item>("").is_err());
        assert!(store.load::<Item>("../escape").is_err());
        assert!(store.save::<Item>(".hidden", &[]).is_err());
    }

    #[test]
    fn test_corrupt_blob_is_error() {
        let temp = TempDir::new().unwrap();
        let store = Store::open(temp.path()).unwrap();
        fs::write(store.blob_path("plan"), "{not json").unwrap();
        assert!(store.load::<Item>("plan").is_err());
    }
}
