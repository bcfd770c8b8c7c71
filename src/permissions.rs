//! Permission checks run before any mutation.

use crate::errors::{RelocationError, Result};
use crate::resource::{FileHandle, FolderHandle};
use crate::storage::StorageRef;

/// Each check defaults to allowing the operation.
pub trait PermissionGate {
    fn assure_file_copy(&self, _source: &FileHandle, _target: &FolderHandle) -> Result<()> {
        Ok(())
    }

    fn assure_file_move(&self, _source: &FileHandle, _target: &FolderHandle, _remove_original: bool) -> Result<()> {
        Ok(())
    }

    fn assure_folder_copy(&self, _source: &FolderHandle, _target: &FolderHandle) -> Result<()> {
        Ok(())
    }

    fn assure_folder_move(&self, _source: &FolderHandle, _target: &FolderHandle, _remove_original: bool) -> Result<()> {
        Ok(())
    }

    fn assure_folder_rename(&self, _folder: &FolderHandle, _new_name: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl PermissionGate for AllowAll {}

/// Refuses writes into, and removals from, storages marked read-only.
/// A move that keeps its original only needs a writable target.
#[derive(Debug, Default, Clone, Copy)]
pub struct WritableStorageGate;

impl WritableStorageGate {
    fn require_writable(storage: &StorageRef, identifier: &str, action: &str) -> Result<()> {
        if storage.is_writable() {
            return Ok(());
        }
        Err(RelocationError::PermissionDenied {
            identifier: identifier.to_string(),
            context: format!("storage {} ('{}') is read-only; cannot {action}", storage.uid(), storage.name()),
        })
    }
}

impl PermissionGate for WritableStorageGate {
    fn assure_file_copy(&self, _source: &FileHandle, target: &FolderHandle) -> Result<()> {
        Self::require_writable(&target.storage(), &target.identifier(), "copy into it")
    }

    fn assure_file_move(&self, source: &FileHandle, target: &FolderHandle, remove_original: bool) -> Result<()> {
        if remove_original {
            Self::require_writable(&source.storage(), &source.identifier(), "move out of it")?;
        }
        Self::require_writable(&target.storage(), &target.identifier(), "move into it")
    }

    fn assure_folder_copy(&self, _source: &FolderHandle, target: &FolderHandle) -> Result<()> {
        Self::require_writable(&target.storage(), &target.identifier(), "copy into it")
    }

    fn assure_folder_move(&self, source: &FolderHandle, target: &FolderHandle, remove_original: bool) -> Result<()> {
        if remove_original {
            Self::require_writable(&source.storage(), &source.identifier(), "move out of it")?;
        }
        Self::require_writable(&target.storage(), &target.identifier(), "move into it")
    }

    fn assure_folder_rename(&self, folder: &FolderHandle, _new_name: &str) -> Result<()> {
        Self::require_writable(&folder.storage(), &folder.identifier(), "rename in it")
    }
}
