//! Breadth-first tree integration.
//!
//! Mirrors a source subtree into a target folder one entry at a time, reusing
//! target subfolders that already exist and running the file operation for
//! every file. Used whenever a backend-native subtree operation is not
//! possible (cross storage) or not wanted (merge into an existing folder).

use std::collections::VecDeque;

use tracing::{debug, info};

use super::Relocator;
use crate::conflict::ConflictMode;
use crate::errors::Result;
use crate::resource::FolderHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileAction {
    Copy,
    Move { remove_original: bool },
}

/// Counters reported once an integration finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationStats {
    pub folders_visited: usize,
    pub folders_created: usize,
    pub files: usize,
}

impl Relocator {
    pub(crate) fn integrate_tree(
        &self,
        source: &FolderHandle,
        target: &FolderHandle,
        mode: ConflictMode,
        action: FileAction,
    ) -> Result<IntegrationStats> {
        let mut stats = IntegrationStats::default();
        let mut queue = VecDeque::from([(source.clone(), target.clone())]);

        while let Some((src, dest)) = queue.pop_front() {
            stats.folders_visited += 1;

            for sub in src.subfolders()? {
                let name = sub.name();
                let dest_sub = if dest.has_folder(&name)? {
                    dest.subfolder(&name)?
                } else {
                    stats.folders_created += 1;
                    dest.create_folder(&name)?
                };
                queue.push_back((sub, dest_sub));
            }

            let src_storage = src.storage();
            for id in src.file_identifiers()? {
                let file = self.catalog.resolve(&src_storage, &id)?;
                match action {
                    FileAction::Copy => {
                        self.copy_file(&file, &dest, None, mode)?;
                    }
                    FileAction::Move { remove_original } => {
                        self.move_file(&file, &dest, None, mode, remove_original)?;
                    }
                }
                stats.files += 1;
            }
            debug!(src = %src.identifier(), dest = %dest.identifier(), pending = queue.len(), "integrated folder level");
        }

        info!(
            src = %source.identifier(),
            dest = %target.identifier(),
            folders = stats.folders_visited,
            created = stats.folders_created,
            files = stats.files,
            "tree integration complete"
        );
        Ok(stats)
    }
}
