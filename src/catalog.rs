//! Catalog contracts and the in-memory reference catalog.
//!
//! The engine asks two things of a catalog: rehydrate a handle from
//! `(storage, identifier)` and persist a handle after its identifier or
//! storage changed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::errors::{RelocationError, Result};
use crate::resource::{FileHandle, FileKind};
use crate::storage::identifier::as_file;
use crate::storage::{StorageRef, backend_error};

/// Persists relocated handles.
pub trait Indexer {
    fn update_index_entry(&self, file: &FileHandle) -> Result<()>;
}

/// Rehydrates handles; fails with `NotFound` for unknown identifiers.
pub trait ResourceFactory {
    fn resolve(&self, storage: &StorageRef, identifier: &str) -> Result<FileHandle>;
}

/// Both catalog roles, as the engine holds them.
pub trait Catalog: Indexer + ResourceFactory {}

impl<T: Indexer + ResourceFactory> Catalog for T {}

type Key = (u32, String);

/// Records keyed by (storage uid, identifier). Resolving a known key returns
/// the cataloged handle itself, so relocations show up in every caller's copy.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    records: RefCell<HashMap<Key, FileHandle>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle under its current location.
    pub fn insert(&self, file: &FileHandle) {
        let key = (file.storage().uid(), file.identifier());
        self.records.borrow_mut().insert(key, file.clone());
    }

    pub fn get(&self, storage_uid: u32, identifier: &str) -> Option<FileHandle> {
        self.records
            .borrow()
            .get(&(storage_uid, as_file(identifier)))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Identifiers cataloged for one storage, sorted.
    pub fn identifiers(&self, storage_uid: u32) -> Vec<String> {
        let mut ids: Vec<String> = self
            .records
            .borrow()
            .keys()
            .filter(|(uid, _)| *uid == storage_uid)
            .map(|(_, id)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}

impl Indexer for MemoryCatalog {
    fn update_index_entry(&self, file: &FileHandle) -> Result<()> {
        let key = (file.storage().uid(), file.identifier());
        let mut records = self.records.borrow_mut();
        records.retain(|k, existing| *k == key || !existing.same_record(file));
        let replaced = records
            .insert(key.clone(), file.clone())
            .is_some_and(|previous| !previous.same_record(file));
        if replaced {
            debug!(storage = key.0, identifier = %key.1, "catalog record replaced");
        }
        trace!(storage = key.0, identifier = %key.1, "catalog record updated");
        Ok(())
    }
}

impl ResourceFactory for MemoryCatalog {
    fn resolve(&self, storage: &StorageRef, identifier: &str) -> Result<FileHandle> {
        let id = as_file(identifier);
        let key = (storage.uid(), id.clone());
        if let Some(found) = self.records.borrow().get(&key) {
            return Ok(found.clone());
        }
        let exists = storage
            .driver()
            .file_exists_at(&id)
            .map_err(backend_error("check file", &id))?;
        if !exists {
            return Err(RelocationError::not_found(storage.uid(), id));
        }
        let file = FileHandle::new(Rc::clone(storage), &id, FileKind::Original);
        debug!(storage = storage.uid(), identifier = %id, "indexed uncataloged file");
        self.records.borrow_mut().insert(key, file.clone());
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryDriver, Storage};

    fn storage() -> StorageRef {
        Storage::new(3, "mem", MemoryDriver::new().with_file("/a/x.txt", "x"))
    }

    #[test]
    fn resolve_returns_the_cataloged_handle() {
        let s = storage();
        let catalog = MemoryCatalog::new();
        let first = catalog.resolve(&s, "/a/x.txt").unwrap();
        let second = catalog.resolve(&s, "/a/x.txt").unwrap();
        assert!(first.same_record(&second));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn resolve_missing_is_not_found() {
        let catalog = MemoryCatalog::new();
        let err = catalog.resolve(&storage(), "/a/nope.txt").unwrap_err();
        assert!(matches!(err, RelocationError::NotFound { storage: 3, .. }));
        assert!(catalog.is_empty());
    }

    #[test]
    fn update_rekeys_the_record() {
        let s = storage();
        let catalog = MemoryCatalog::new();
        let file = catalog.resolve(&s, "/a/x.txt").unwrap();
        file.relocate("/b/x.txt".into(), Rc::clone(&s));
        catalog.update_index_entry(&file).unwrap();

        assert!(catalog.get(3, "/a/x.txt").is_none());
        assert!(catalog.get(3, "/b/x.txt").unwrap().same_record(&file));
        assert_eq!(catalog.identifiers(3), vec!["/b/x.txt"]);
    }
}
