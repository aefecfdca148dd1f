//! JSON-file storage backend.
//!
//! The whole map is cached in memory for reads. Every change re-reads the
//! file, applies the change to that copy, and writes it to a sibling temp file
//! which is then renamed over the original. The cache is only replaced once
//! the rename succeeds, so a failed write leaves both memory and disk as they
//! were.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use super::{StorageBackend, StorageError};

/// A string map persisted as a JSON object on disk.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileBackend {
    /// Open (or lazily create) the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = read_map(&path)?;
        debug!(path = %path.display(), keys = values.len(), "Opened storage file");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to the current file contents and persist the result.
    ///
    /// `change` returns whether it modified the map; unmodified maps are not
    /// written back.
    fn update<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut values = self.values.lock();
        let mut next = read_map(&self.path)?;
        if change(&mut next) {
            self.persist(&next)?;
        }
        *values = next;
        Ok(())
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|values| {
            values.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|values| values.remove(key).is_some())
    }
}

/// Read the map at `path`. A missing or blank file is an empty map.
fn read_map(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
    match fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let backend = FileBackend::open(&path).unwrap();
        backend.set("token", "abc").unwrap();
        backend.set("userName", "Asha").unwrap();
        backend.remove("userName").unwrap();
        drop(backend);

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.get("userName").unwrap(), None);
    }

    #[test]
    fn test_missing_and_empty_files_open_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FileBackend::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(missing.get("token").unwrap(), None);

        let empty_path = dir.path().join("empty.json");
        fs::write(&empty_path, "").unwrap();
        let empty = FileBackend::open(&empty_path).unwrap();
        assert_eq!(empty.get("token").unwrap(), None);
    }

    #[test]
    fn test_failed_write_keeps_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        let backend = FileBackend::open(sub.join("storage.json")).unwrap();
        backend.set("token", "old").unwrap();

        // A plain file where the parent directory used to be.
        fs::remove_dir_all(&sub).unwrap();
        fs::write(&sub, "").unwrap();

        assert!(backend.set("token", "new").is_err());
        assert_eq!(backend.get("token").unwrap().as_deref(), Some("old"));

        assert!(backend.remove("token").is_err());
        assert_eq!(backend.get("token").unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn test_writes_from_two_handles_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let first = FileBackend::open(&path).unwrap();
        first.set("token", "abc").unwrap();
        let second = FileBackend::open(&path).unwrap();

        first.remove("token").unwrap();
        second.set("userName", "Asha").unwrap();

        assert_eq!(second.get("token").unwrap(), None);
        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.get("token").unwrap(), None);
        assert_eq!(reopened.get("userName").unwrap().as_deref(), Some("Asha"));
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(
            FileBackend::open(&path),
            Err(StorageError::Json(_))
        ));
    }
}
