//! Destination decision for folder copies and moves.

use tracing::debug;

use super::Relocator;
use crate::conflict::ConflictMode;
use crate::errors::{RelocationError, Result};
use crate::resource::FolderHandle;
use crate::storage::Storage;
use crate::storage::identifier::{folder_in, is_within};

/// Where a folder operation lands.
#[derive(Debug, Clone)]
pub enum TargetFolder {
    /// Backend-native operation into the destination parent under `name`.
    InPlace { name: String },
    /// Entry-by-entry integration into an existing (or freshly created) folder.
    Integrated { folder: FolderHandle },
}

impl Relocator {
    /// Decide how `source` enters `target_parent`.
    ///
    /// `force_integration` rules out the in-place branch even when both
    /// folders share a storage.
    pub fn find_target_folder(
        &self,
        source: &FolderHandle,
        target_parent: &FolderHandle,
        name: Option<&str>,
        mode: ConflictMode,
        force_integration: bool,
    ) -> Result<TargetFolder> {
        let same_storage = Storage::same(&source.storage(), &self.storage);
        let requested = name.map(str::to_owned).unwrap_or_else(|| source.name());

        if requested.is_empty() {
            match mode {
                ConflictMode::RenameNewFile | ConflictMode::Integrate => {
                    if same_storage && source.identifier() == target_parent.identifier() {
                        return Err(identical(source));
                    }
                }
                _ => {
                    return Err(RelocationError::invalid(format!(
                        "invalid source folder '{}' for policy {mode}",
                        source.identifier()
                    )));
                }
            }
        }

        if same_storage && is_within(&target_parent.identifier(), &source.identifier()) {
            return Err(RelocationError::invalid(format!(
                "target folder '{}' lies inside source folder '{}'",
                target_parent.identifier(),
                source.identifier()
            )));
        }

        if requested.is_empty() {
            return Ok(TargetFolder::Integrated {
                folder: target_parent.clone(),
            });
        }

        let mut name = self.sanitize(&requested)?;
        let mut forced = force_integration;
        if target_parent.has_entry(&name)? {
            match mode {
                ConflictMode::Cancel => {
                    return Err(RelocationError::TargetExists {
                        name,
                        folder: target_parent.identifier(),
                    });
                }
                ConflictMode::RenameNewFolder => {
                    name = self.names.resolve(target_parent, &name)?;
                }
                ConflictMode::RenameNewFile | ConflictMode::Integrate => {
                    if same_storage && folder_in(&target_parent.identifier(), &name) == source.identifier() {
                        return Err(identical(source));
                    }
                    if target_parent.has_folder(&name)? {
                        forced = true;
                    } else {
                        // A file holds the name; there is no folder to merge into.
                        name = self.names.resolve(target_parent, &name)?;
                    }
                }
            }
        }

        if !forced && same_storage {
            debug!(src = %source.identifier(), parent = %target_parent.identifier(), %name, "in-place folder target");
            return Ok(TargetFolder::InPlace { name });
        }

        let folder = if target_parent.has_folder(&name)? {
            target_parent.subfolder(&name)?
        } else {
            target_parent.create_folder(&name)?
        };
        debug!(src = %source.identifier(), dest = %folder.identifier(), forced, "integrating folder");
        Ok(TargetFolder::Integrated { folder })
    }
}

fn identical(source: &FolderHandle) -> RelocationError {
    RelocationError::invalid(format!(
        "source and target folder are identical ('{}')",
        source.identifier()
    ))
}
