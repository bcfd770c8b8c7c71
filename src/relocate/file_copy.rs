//! File copy, plus the naming and transfer steps shared with file moves.

use tracing::{debug, info};

use super::Relocator;
use crate::conflict::ConflictMode;
use crate::errors::{RelocationError, Result};
use crate::hooks::{Operation, RelocationEvent};
use crate::resource::{FileHandle, FolderHandle};
use crate::storage::{Storage, backend_error};

impl Relocator {
    /// Copy `file` into `target`. The source handle is left untouched.
    pub fn copy_file(
        &self,
        file: &FileHandle,
        target: &FolderHandle,
        name: Option<&str>,
        mode: ConflictMode,
    ) -> Result<FileHandle> {
        self.ensure_own_folder(target)?;
        let requested = self.sanitize(&name.map(str::to_owned).unwrap_or_else(|| file.name()))?;
        self.gate.assure_file_copy(file, target)?;
        let name = self.file_target_name(target, &requested, mode)?;

        let event = RelocationEvent::file(Operation::FileCopy, file, target);
        self.hooks.before(&event);
        let new_id = self.transfer_file(file, target, &name, false)?;
        let copy = self.catalog.resolve(&self.storage, &new_id)?;
        self.hooks.after(&event);

        info!(
            src = %file.identifier(),
            src_storage = file.storage().uid(),
            dest = %new_id,
            storage = self.storage.uid(),
            "copied file"
        );
        Ok(copy)
    }

    /// Final name for a file entering `target` under `mode`.
    pub(super) fn file_target_name(&self, target: &FolderHandle, name: &str, mode: ConflictMode) -> Result<String> {
        if !target.has_entry(name)? {
            return Ok(name.to_string());
        }
        if mode.cancels_on_file_collision() {
            return Err(RelocationError::TargetExists {
                name: name.to_string(),
                folder: target.identifier(),
            });
        }
        let resolved = self.names.resolve(target, name)?;
        debug!(folder = %target.identifier(), requested = %name, resolved = %resolved, policy = %mode, "name taken; renamed");
        Ok(resolved)
    }

    /// Physical copy or move of `file` into `target` under `name`. Returns the new identifier.
    pub(super) fn transfer_file(
        &self,
        file: &FileHandle,
        target: &FolderHandle,
        name: &str,
        remove_original: bool,
    ) -> Result<String> {
        let source_storage = file.storage();
        let src_id = file.identifier();
        let dest_id = target.identifier();
        let driver = self.storage.driver();

        if Storage::same(&source_storage, &self.storage) {
            return if remove_original {
                driver
                    .move_file_within_storage(&src_id, &dest_id, name)
                    .map_err(backend_error("move file", &src_id))
            } else {
                driver
                    .copy_file_within_storage(&src_id, &dest_id, name)
                    .map_err(backend_error("copy file", &src_id))
            };
        }

        let local = source_storage
            .driver()
            .local_copy(&src_id)
            .map_err(backend_error("read file", &src_id))?;
        let new_id = driver
            .add_file(local.path(), &dest_id, name, false)
            .map_err(backend_error("add file", &dest_id))?;
        if remove_original {
            source_storage
                .driver()
                .delete_file(&src_id)
                .map_err(backend_error("delete file", &src_id))?;
            debug!(src = %src_id, storage = source_storage.uid(), "removed source after cross-storage move");
        }
        Ok(new_id)
    }
}
