//! Folder copies into a parent folder, in place or by integration.

use tracing::info;

use super::integrate::FileAction;
use super::{Relocator, TargetFolder};
use crate::conflict::ConflictMode;
use crate::errors::Result;
use crate::hooks::{Operation, RelocationEvent};
use crate::resource::FolderHandle;
use crate::storage::backend_error;
use crate::storage::identifier::folder_in;

impl Relocator {
    /// Copy `folder` into `target_parent` and return the resulting folder.
    pub fn copy_folder(
        &self,
        folder: &FolderHandle,
        target_parent: &FolderHandle,
        name: Option<&str>,
        mode: ConflictMode,
    ) -> Result<FolderHandle> {
        self.ensure_own_folder(target_parent)?;
        self.gate.assure_folder_copy(folder, target_parent)?;
        let target = self.find_target_folder(folder, target_parent, name, mode, false)?;

        let event = RelocationEvent::folder(Operation::FolderCopy, folder, target_parent);
        self.hooks.before(&event);
        let copied = match target {
            TargetFolder::InPlace { name } => {
                let src_id = folder.identifier();
                let parent_id = target_parent.identifier();
                self.storage
                    .driver()
                    .copy_folder_within_storage(&src_id, &parent_id, &name)
                    .map_err(backend_error("copy folder", &src_id))?;
                self.storage.folder(&folder_in(&parent_id, &name))?
            }
            TargetFolder::Integrated { folder: dest } => {
                self.integrate_tree(folder, &dest, mode, FileAction::Copy)?;
                dest
            }
        };
        self.hooks.after(&event);

        info!(
            src = %folder.identifier(),
            src_storage = folder.storage().uid(),
            dest = %copied.identifier(),
            storage = self.storage.uid(),
            "copied folder"
        );
        Ok(copied)
    }
}
