//! Storages and the driver contract.
//!
//! A `Storage` couples a uid with the `Driver` that performs physical work.
//! Storage identity is handle identity (`Rc::ptr_eq`): two storages with the
//! same configuration are still two storages.

pub mod helpers;
pub mod identifier;
mod io_copy;
pub mod local;
pub mod memory;

pub use helpers::{backend_error, io_error_with_help_io};
pub use local::LocalDriver;
pub use memory::MemoryDriver;

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::NamedTempFile;

use crate::errors::{RelocationError, Result};
use crate::resource::FolderHandle;

/// Old identifier -> new identifier for a folder and every descendant.
pub type IdentifierMap = BTreeMap<String, String>;

/// Shared handle to a storage.
pub type StorageRef = Rc<Storage>;

/// A file made available on the local filesystem for reading.
#[derive(Debug)]
pub enum LocalCopy {
    /// The backend already keeps the bytes at this path.
    InPlace(PathBuf),
    /// A temporary copy, removed when dropped.
    Temporary(NamedTempFile),
}

impl LocalCopy {
    pub fn path(&self) -> &Path {
        match self {
            LocalCopy::InPlace(p) => p,
            LocalCopy::Temporary(t) => t.path(),
        }
    }
}

/// Physical backend operations. Identifiers follow `identifier`'s conventions.
///
/// Every method is a single blocking backend call; the engine provides no
/// locking around them.
pub trait Driver {
    /// Short backend name for logs ("local", "memory").
    fn kind(&self) -> &'static str;

    /// Turn a user supplied name into one the backend accepts.
    fn sanitize_name(&self, name: &str) -> io::Result<String>;

    fn file_exists(&self, name: &str, folder_id: &str) -> io::Result<bool>;
    fn folder_exists(&self, name: &str, folder_id: &str) -> io::Result<bool>;
    fn file_exists_at(&self, id: &str) -> io::Result<bool>;
    fn folder_exists_at(&self, id: &str) -> io::Result<bool>;

    /// File identifiers directly inside `folder_id`, sorted by name.
    fn files_in_folder(&self, folder_id: &str) -> io::Result<Vec<String>>;
    /// Folder identifiers directly inside `folder_id`, sorted by name.
    fn folders_in_folder(&self, folder_id: &str) -> io::Result<Vec<String>>;

    fn create_folder(&self, name: &str, parent_id: &str) -> io::Result<String>;
    fn delete_folder(&self, id: &str, recursive: bool) -> io::Result<()>;

    fn copy_file_within_storage(&self, src_id: &str, dest_folder_id: &str, name: &str) -> io::Result<String>;
    fn move_file_within_storage(&self, src_id: &str, dest_folder_id: &str, name: &str) -> io::Result<String>;

    /// Ingest a file from the local filesystem (typically coming from another backend).
    fn add_file(&self, local: &Path, dest_folder_id: &str, name: &str, allow_overwrite: bool) -> io::Result<String>;
    fn delete_file(&self, id: &str) -> io::Result<()>;

    /// Local-processing representation of a file.
    fn local_copy(&self, id: &str) -> io::Result<LocalCopy>;
    fn file_contents(&self, id: &str) -> io::Result<Vec<u8>>;

    fn copy_folder_within_storage(&self, src_id: &str, dest_parent_id: &str, name: &str) -> io::Result<()>;
    fn move_folder_within_storage(&self, src_id: &str, dest_parent_id: &str, name: &str) -> io::Result<IdentifierMap>;
    fn rename_folder(&self, id: &str, new_name: &str) -> io::Result<IdentifierMap>;
}

pub struct Storage {
    uid: u32,
    name: String,
    writable: bool,
    driver: Box<dyn Driver>,
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("uid", &self.uid)
            .field("name", &self.name)
            .field("writable", &self.writable)
            .field("driver", &self.driver.kind())
            .finish()
    }
}

impl Storage {
    pub fn new(uid: u32, name: impl Into<String>, driver: impl Driver + 'static) -> StorageRef {
        Rc::new(Self {
            uid,
            name: name.into(),
            writable: true,
            driver: Box::new(driver),
        })
    }

    /// Same as `new`, but marks the storage read-only for permission gates.
    pub fn read_only(uid: u32, name: impl Into<String>, driver: impl Driver + 'static) -> StorageRef {
        Rc::new(Self {
            uid,
            name: name.into(),
            writable: false,
            driver: Box::new(driver),
        })
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Handle identity, never configuration equality.
    pub fn same(a: &StorageRef, b: &StorageRef) -> bool {
        Rc::ptr_eq(a, b)
    }

    pub fn root_folder(self: &Rc<Self>) -> FolderHandle {
        FolderHandle::new(Rc::clone(self), identifier::ROOT)
    }

    /// Rehydrate a folder handle; fails with `NotFound` when the backend has no such folder.
    pub fn folder(self: &Rc<Self>, id: &str) -> Result<FolderHandle> {
        let id = identifier::as_folder(id);
        let exists = self
            .driver
            .folder_exists_at(&id)
            .map_err(backend_error("check folder", &id))?;
        if !exists {
            return Err(RelocationError::not_found(self.uid, id));
        }
        Ok(FolderHandle::new(Rc::clone(self), &id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_by_handle() {
        let a = Storage::new(1, "a", MemoryDriver::new());
        let b = Storage::new(1, "a", MemoryDriver::new());
        assert!(Storage::same(&a, &Rc::clone(&a)));
        assert!(!Storage::same(&a, &b));
    }

    #[test]
    fn folder_lookup_reports_missing() {
        let s = Storage::new(7, "mem", MemoryDriver::new());
        assert_eq!(s.folder("/").unwrap().identifier(), "/");
        let err = s.folder("/nope/").unwrap_err();
        assert!(matches!(err, RelocationError::NotFound { storage: 7, .. }));
    }
}
