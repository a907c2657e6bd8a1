//! Durable key-value storage used by the local auth backend.
//!
//! Models the browser-local persistent store the tracker runs against: a
//! handful of string keys mapped to serialized text records. Two
//! implementations are provided, an in-memory map for tests and ephemeral
//! sessions, and a directory-backed store where each key is one file so
//! values survive a restart.

use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use crate::Error;

/// A durable string-keyed, string-valued store.
///
/// Values are opaque to the store; the backend decides the record format.
pub trait LocalStorage {
    /// Read the value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;

    /// Delete the value stored under `key`. Removing an absent key is not an
    /// error.
    fn remove(&mut self, key: &str) -> Result<(), Error>;
}

/// An in-memory [LocalStorage].
///
/// Clones share the same underlying map, so a cloned handle can be used to
/// simulate a reload: build a fresh backend over the clone and the stored
/// session is still there.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    /// # Panics
    ///
    /// Panics if the lock on the map is poisoned.
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    /// # Panics
    ///
    /// Panics if the lock on the map is poisoned.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the lock on the map is poisoned.
    fn remove(&mut self, key: &str) -> Result<(), Error> {
        self.entries.lock().unwrap().remove(key);

        Ok(())
    }
}

/// A [LocalStorage] that persists each key as one file in a directory.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [Error::StorageError] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl LocalStorage for DirStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        fs::write(self.path_for(key), value)?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod memory_storage_tests {
    use super::{LocalStorage, MemoryStorage};

    #[test]
    fn get_returns_none_for_absent_key() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.get("user").unwrap(), None);
    }

    #[test]
    fn set_then_get_returns_the_value() {
        let mut storage = MemoryStorage::new();

        storage.set("user", "some-record").unwrap();

        assert_eq!(storage.get("user").unwrap().as_deref(), Some("some-record"));
    }

    #[test]
    fn clones_share_the_same_entries() {
        let mut storage = MemoryStorage::new();
        let clone = storage.clone();

        storage.set("users", "record-table").unwrap();

        assert_eq!(clone.get("users").unwrap().as_deref(), Some("record-table"));
    }

    #[test]
    fn remove_deletes_the_value_and_tolerates_absent_keys() {
        let mut storage = MemoryStorage::new();
        storage.set("user", "some-record").unwrap();

        storage.remove("user").unwrap();
        storage.remove("user").unwrap();

        assert_eq!(storage.get("user").unwrap(), None);
    }
}
