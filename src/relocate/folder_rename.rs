//! In-place folder rename that rewrites every descendant identifier.

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::rc::Rc;

use tracing::info;

use super::Relocator;
use crate::errors::{RelocationError, Result};
use crate::hooks::RelocationEvent;
use crate::resource::{FileHandle, FolderHandle};
use crate::storage::backend_error;
use crate::storage::identifier::folder_in;

impl Relocator {
    /// Rename `folder` inside its parent. Every file below it is rehydrated
    /// first and rewritten to the new prefix afterwards.
    pub fn rename_folder(&self, folder: &FolderHandle, new_name: &str) -> Result<FolderHandle> {
        if folder.is_root() {
            return Err(RelocationError::invalid("the root folder cannot be renamed"));
        }
        self.ensure_own_folder(folder)?;
        let name = self.sanitize(new_name)?;
        self.gate.assure_folder_rename(folder, &name)?;

        let parent = folder.parent_folder();
        if parent.has_entry(&name)? {
            return Err(RelocationError::TargetExists {
                name,
                folder: parent.identifier(),
            });
        }

        let old_id = folder.identifier();
        let event = RelocationEvent::rename(folder, &name);
        self.hooks.before(&event);

        let files = self.collect_files(folder)?;
        let map = self
            .storage
            .driver()
            .rename_folder(&old_id, &name)
            .map_err(backend_error("rename folder", &old_id))?;

        for (old, file) in &files {
            let new = map.get(old).ok_or_else(|| {
                backend_error("rename folder", old)(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "driver reported no new identifier for this file",
                ))
            })?;
            file.relocate(new.clone(), Rc::clone(&self.storage));
            self.catalog.update_index_entry(file)?;
        }

        let new_id = map
            .get(&old_id)
            .cloned()
            .unwrap_or_else(|| folder_in(&parent.identifier(), &name));
        folder.relocate(new_id.clone(), Rc::clone(&self.storage));
        let renamed = self.storage.folder(&new_id)?;
        self.hooks.after(&event);

        info!(src = %old_id, dest = %new_id, storage = self.storage.uid(), files = files.len(), "renamed folder");
        Ok(renamed)
    }

    /// Every file below `folder`, keyed by identifier.
    fn collect_files(&self, folder: &FolderHandle) -> Result<BTreeMap<String, FileHandle>> {
        let storage = folder.storage();
        let mut files = BTreeMap::new();
        let mut queue = VecDeque::from([folder.clone()]);
        while let Some(current) = queue.pop_front() {
            queue.extend(current.subfolders()?);
            for id in current.file_identifiers()? {
                let file = self.catalog.resolve(&storage, &id)?;
                files.insert(id, file);
            }
        }
        Ok(files)
    }
}
