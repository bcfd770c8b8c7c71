//! File moves: same-storage rename or cross-storage transfer, then catalog update.

use std::rc::Rc;

use tracing::info;

use super::Relocator;
use crate::conflict::ConflictMode;
use crate::errors::{RelocationError, Result};
use crate::hooks::{Operation, RelocationEvent};
use crate::resource::{FileHandle, FolderHandle};

impl Relocator {
    /// Move `file` into `target`, updating the handle and its catalog record in place.
    ///
    /// With `remove_original == false` the source stays where it is and the
    /// handle follows the new copy.
    pub fn move_file(
        &self,
        file: &FileHandle,
        target: &FolderHandle,
        name: Option<&str>,
        mode: ConflictMode,
        remove_original: bool,
    ) -> Result<()> {
        if !file.kind().is_relocatable() {
            return Err(RelocationError::UnsupportedResourceType {
                identifier: file.identifier(),
                kind: file.kind().as_str(),
            });
        }
        if file.is_deleted() {
            return Err(RelocationError::invalid(format!(
                "cannot move deleted file '{}'",
                file.identifier()
            )));
        }
        self.ensure_own_folder(target)?;
        let requested = self.sanitize(&name.map(str::to_owned).unwrap_or_else(|| file.name()))?;
        self.gate.assure_file_move(file, target, remove_original)?;
        let name = self.file_target_name(target, &requested, mode)?;

        let original_parent = file.parent_folder();
        let src_id = file.identifier();
        let src_storage = file.storage().uid();

        self.hooks.before(&RelocationEvent::file(Operation::FileMove, file, target));
        let new_id = self.transfer_file(file, target, &name, remove_original)?;
        file.relocate(new_id.clone(), Rc::clone(&self.storage));
        self.catalog.update_index_entry(file)?;
        self.hooks.after(
            &RelocationEvent::file(Operation::FileMove, file, target).with_original_parent(&original_parent),
        );

        info!(
            src = %src_id,
            src_storage,
            dest = %new_id,
            storage = self.storage.uid(),
            remove_original,
            "moved file"
        );
        Ok(())
    }

    /// `move_file` with the default file policy, keeping the current name.
    pub fn move_file_to(&self, file: &FileHandle, target: &FolderHandle) -> Result<()> {
        self.move_file(file, target, None, ConflictMode::FILE_DEFAULT, true)
    }
}
