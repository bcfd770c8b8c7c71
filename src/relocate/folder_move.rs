//! Folder moves: backend-native when possible, integration otherwise.

use std::rc::Rc;

use tracing::{info, warn};

use super::integrate::FileAction;
use super::{Relocator, TargetFolder};
use crate::conflict::ConflictMode;
use crate::errors::{RelocationError, Result};
use crate::hooks::{Operation, RelocationEvent};
use crate::resource::FolderHandle;
use crate::storage::identifier::{folder_in, is_folder};
use crate::storage::{IdentifierMap, StorageRef, backend_error};

impl Relocator {
    /// Move `folder` into `target_parent`; the handle is updated in place.
    ///
    /// With `remove_original == false` the tree is integrated (copied) and the
    /// source stays; the handle then points at the new folder.
    pub fn move_folder(
        &self,
        folder: &FolderHandle,
        target_parent: &FolderHandle,
        name: Option<&str>,
        mode: ConflictMode,
        remove_original: bool,
    ) -> Result<()> {
        self.ensure_own_folder(target_parent)?;
        if remove_original && folder.is_root() {
            return Err(RelocationError::invalid(format!(
                "the root folder of storage {} cannot be moved",
                folder.storage().uid()
            )));
        }
        self.gate.assure_folder_move(folder, target_parent, remove_original)?;
        let target = self.find_target_folder(folder, target_parent, name, mode, !remove_original)?;

        let src_id = folder.identifier();
        let src_storage = folder.storage();
        self.hooks.before(&RelocationEvent::folder(Operation::FolderMove, folder, target_parent));

        let mut skipped = 0usize;
        let new_id = match target {
            TargetFolder::InPlace { name } => {
                let parent_id = target_parent.identifier();
                let map = self
                    .storage
                    .driver()
                    .move_folder_within_storage(&src_id, &parent_id, &name)
                    .map_err(backend_error("move folder", &src_id))?;
                skipped = self.remap_catalog(&map)?;
                let new_id = map
                    .get(&src_id)
                    .cloned()
                    .unwrap_or_else(|| folder_in(&parent_id, &name));
                self.storage.folder(&new_id)?.identifier()
            }
            TargetFolder::Integrated { folder: dest } => {
                self.integrate_tree(folder, &dest, mode, FileAction::Move { remove_original })?;
                if remove_original {
                    remove_emptied_tree(&src_storage, &src_id)?;
                }
                dest.identifier()
            }
        };

        folder.relocate(new_id.clone(), Rc::clone(&self.storage));
        self.hooks.after(&RelocationEvent::folder(Operation::FolderMove, folder, target_parent));

        info!(
            src = %src_id,
            src_storage = src_storage.uid(),
            dest = %new_id,
            storage = self.storage.uid(),
            skipped,
            "moved folder"
        );
        Ok(())
    }

    /// `move_folder` with the default folder policy, keeping the current name.
    pub fn move_folder_to(&self, folder: &FolderHandle, target_parent: &FolderHandle) -> Result<()> {
        self.move_folder(folder, target_parent, None, ConflictMode::FOLDER_DEFAULT, true)
    }

    /// Apply a driver's old -> new map to cataloged files. Returns the number
    /// of entries without a catalog record.
    fn remap_catalog(&self, map: &IdentifierMap) -> Result<usize> {
        let mut skipped = 0;
        for (old, new) in map {
            if is_folder(old) {
                continue;
            }
            match self.catalog.resolve(&self.storage, old) {
                Ok(file) => {
                    file.relocate(new.clone(), Rc::clone(&self.storage));
                    self.catalog.update_index_entry(&file)?;
                }
                Err(RelocationError::NotFound { .. }) => {
                    warn!(old = %old, new = %new, storage = self.storage.uid(), "no catalog record for moved file; skipping");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(skipped)
    }
}

/// Delete the folders left behind by an integrated move, deepest first.
/// Each delete is non-recursive, so an entry the integration did not move
/// fails the operation instead of being destroyed.
fn remove_emptied_tree(storage: &StorageRef, root_id: &str) -> Result<()> {
    let driver = storage.driver();
    let mut order = vec![root_id.to_string()];
    let mut next = 0;
    while next < order.len() {
        let children = driver
            .folders_in_folder(&order[next])
            .map_err(backend_error("list folder", &order[next]))?;
        order.extend(children);
        next += 1;
    }
    for id in order.iter().rev() {
        driver.delete_folder(id, false).map_err(backend_error("delete folder", id))?;
    }
    Ok(())
}
