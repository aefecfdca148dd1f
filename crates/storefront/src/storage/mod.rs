//! Durable per-origin key-value storage.
//!
//! Mirrors browser `localStorage`: every tab of an origin sees the same string
//! map, and a write made by one tab is announced to every *other* tab of that
//! origin (never to the writer). Sessions persist here so that they survive
//! reloads and are shared between tabs.
//!
//! # Backends
//!
//! - [`MemoryBackend`] - in-process map, used by tests and embedded callers
//! - [`FileBackend`] - JSON file, used by the CLI so logins survive restarts

mod file;
mod memory;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Capacity of the cross-tab change channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file does not contain a JSON string map.
    #[error("storage file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string key-value store shared by all tabs of an origin.
pub trait StorageBackend: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Identifies one tab (storage handle) within an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(Uuid);

impl TabId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Internal notice sent on every write.
#[derive(Debug, Clone)]
struct StorageNotice {
    source: TabId,
    key: String,
}

/// A change made by another tab of the same origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignChange {
    /// The given key was set or removed.
    Key(String),
    /// Notifications were dropped; re-read everything of interest.
    Resync,
}

/// Durable storage for one origin, shared by all of its tabs.
#[derive(Clone)]
pub struct OriginStorage {
    inner: Arc<OriginInner>,
}

struct OriginInner {
    backend: Box<dyn StorageBackend>,
    changes: broadcast::Sender<StorageNotice>,
}

impl OriginStorage {
    /// An origin backed by an in-memory map.
    #[must_use]
    pub fn memory() -> Self {
        Self::with_backend(MemoryBackend::default())
    }

    /// An origin backed by a JSON file, created on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn file(path: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        Ok(Self::with_backend(FileBackend::open(path)?))
    }

    /// An origin backed by a custom backend.
    #[must_use]
    pub fn with_backend(backend: impl StorageBackend + 'static) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(OriginInner {
                backend: Box::new(backend),
                changes,
            }),
        }
    }

    /// Open a new tab on this origin.
    #[must_use]
    pub fn open_tab(&self) -> LocalStorage {
        LocalStorage {
            tab: TabId::new(),
            origin: self.clone(),
        }
    }
}

/// One tab's handle on its origin's storage.
#[derive(Clone)]
pub struct LocalStorage {
    tab: TabId,
    origin: OriginStorage,
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorage")
            .field("tab", &self.tab)
            .finish_non_exhaustive()
    }
}

impl LocalStorage {
    /// This tab's identifier.
    #[must_use]
    pub const fn tab_id(&self) -> TabId {
        self.tab
    }

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.origin.inner.backend.get(key)
    }

    /// Write a value and notify the other tabs.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.origin.inner.backend.set(key, value)?;
        self.notify(key);
        Ok(())
    }

    /// Delete a value and notify the other tabs.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.origin.inner.backend.remove(key)?;
        self.notify(key);
        Ok(())
    }

    /// Subscribe to writes made by other tabs of this origin.
    #[must_use]
    pub fn subscribe_foreign(&self) -> ForeignChanges {
        ForeignChanges {
            tab: self.tab,
            rx: self.origin.inner.changes.subscribe(),
        }
    }

    fn notify(&self, key: &str) {
        // No receivers is the common case for a single tab.
        let _ = self.origin.inner.changes.send(StorageNotice {
            source: self.tab,
            key: key.to_owned(),
        });
    }
}

/// Stream of changes made by other tabs.
pub struct ForeignChanges {
    tab: TabId,
    rx: broadcast::Receiver<StorageNotice>,
}

impl ForeignChanges {
    /// Wait for the next foreign change.
    ///
    /// Returns `None` once every handle on the origin has been dropped.
    pub async fn recv(&mut self) -> Option<ForeignChange> {
        loop {
            match self.rx.recv().await {
                Ok(notice) if notice.source == self.tab => {}
                Ok(notice) => return Some(ForeignChange::Key(notice.key)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(tab = %self.tab, skipped, "Storage change listener lagged");
                    return Some(ForeignChange::Resync);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tabs_share_values() {
        let origin = OriginStorage::memory();
        let a = origin.open_tab();
        let b = origin.open_tab();

        a.set("token", "abc").unwrap();
        assert_eq!(b.get("token").unwrap().as_deref(), Some("abc"));

        b.remove("token").unwrap();
        assert_eq!(a.get("token").unwrap(), None);
    }

    #[test]
    fn test_tab_ids_are_unique() {
        let origin = OriginStorage::memory();
        assert_ne!(origin.open_tab().tab_id(), origin.open_tab().tab_id());
    }

    #[tokio::test]
    async fn test_writer_does_not_see_its_own_change() {
        let origin = OriginStorage::memory();
        let a = origin.open_tab();
        let b = origin.open_tab();
        let mut a_changes = a.subscribe_foreign();
        let mut b_changes = b.subscribe_foreign();

        a.set("userName", "Asha").unwrap();
        b.set("userRole", "admin").unwrap();

        assert_eq!(
            b_changes.recv().await,
            Some(ForeignChange::Key("userName".to_string()))
        );
        assert_eq!(
            a_changes.recv().await,
            Some(ForeignChange::Key("userRole".to_string()))
        );
    }

    #[tokio::test]
    async fn test_lagged_listener_gets_resync() {
        let origin = OriginStorage::memory();
        let a = origin.open_tab();
        let b = origin.open_tab();
        let mut b_changes = b.subscribe_foreign();

        for i in 0..(CHANGE_CHANNEL_CAPACITY + 8) {
            a.set("counter", &i.to_string()).unwrap();
        }

        assert_eq!(b_changes.recv().await, Some(ForeignChange::Resync));
    }
}
