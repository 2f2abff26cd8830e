//! Persistent key-value storage for the session
//!
//! Values are plain strings. Multi-key writes and removals are all-or-nothing:
//! the new map is written to a temporary file and renamed over the old one
//! before the in-memory copy changes.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

const STORE_FILE: &str = "storage.yaml";

/// String key-value store with pairwise operations
pub trait KeyValueStore: Send {
    /// Values for `keys`, in the same order
    fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<String>>>;

    /// Write every entry or none
    fn multi_set(&mut self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove every key or none; absent keys are ignored
    fn multi_remove(&mut self, keys: &[&str]) -> Result<()>;
}

/// Store backed by a YAML file in the data directory
pub struct FileStore {
    entries: BTreeMap<String, String>,
    dir: PathBuf,
}

impl FileStore {
    /// Open the store in `dir`, loading existing entries. The directory is
    /// created lazily on first write.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let path = dir.join(STORE_FILE);
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened key-value store");
        Ok(FileStore { entries, dir })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORE_FILE)
    }

    /// Ensure the data directory exists
    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        }
        Ok(())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        self.ensure_dir()?;
        let path = self.path();
        let tmp = tmp_path(&path);
        let content = serde_yaml::to_string(entries)?;
        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl KeyValueStore for FileStore {
    fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        Ok(keys.iter().map(|k| self.entries.get(*k).cloned()).collect())
    }

    fn multi_set(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        let mut next = self.entries.clone();
        for (key, value) in entries {
            next.insert((*key).to_string(), (*value).to_string());
        }
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }

    fn multi_remove(&mut self, keys: &[&str]) -> Result<()> {
        if !keys.iter().any(|k| self.entries.contains_key(*k)) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        for key in keys {
            next.remove(*key);
        }
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }
}

/// In-process store; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        Ok(keys.iter().map(|k| self.entries.get(*k).cloned()).collect())
    }

    fn multi_set(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn multi_remove(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("data")).unwrap();
        store.multi_set(&[("a", "1"), ("b", "{\"x\":2}")]).unwrap();

        let reopened = FileStore::open(dir.path().join("data")).unwrap();
        assert_eq!(
            reopened.multi_get(&["a", "b", "c"]).unwrap(),
            vec![Some("1".to_string()), Some("{\"x\":2}".to_string()), None]
        );
        assert!(!tmp_path(&reopened.path()).exists());
    }

    #[test]
    fn test_file_store_remove_pair() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.multi_set(&[("a", "1"), ("b", "2"), ("keep", "3")]).unwrap();
        store.multi_remove(&["a", "b"]).unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.multi_get(&["a", "b", "keep"]).unwrap(),
            vec![None, None, Some("3".to_string())]
        );
    }

    #[test]
    fn test_remove_absent_keys_does_not_write() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("never")).unwrap();
        store.multi_remove(&["a"]).unwrap();
        assert!(!dir.path().join("never").exists());
    }

    #[test]
    fn test_failed_write_leaves_entries_untouched() {
        let dir = tempdir().unwrap();
        // A regular file where the data directory should be makes every flush fail
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "").unwrap();

        let mut store = FileStore::open(&blocker).unwrap();
        assert!(store.multi_set(&[("a", "1")]).is_err());
        assert_eq!(store.multi_get(&["a"]).unwrap(), vec![None]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(STORE_FILE), "- just\n- a list\n").unwrap();
        assert!(FileStore::open(dir.path()).is_err());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.multi_set(&[("a", "1")]).unwrap();
        assert_eq!(store.multi_get(&["a"]).unwrap(), vec![Some("1".to_string())]);
        store.multi_remove(&["a", "missing"]).unwrap();
        assert_eq!(store.multi_get(&["a"]).unwrap(), vec![None]);
    }
}
