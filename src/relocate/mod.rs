//! Relocation engine.
//!
//! A `Relocator` is bound to one destination storage. Every operation targets
//! a folder in that storage; sources may live anywhere. Physical work goes
//! through the storages' drivers, catalog updates through the `Catalog`.
//!
//! Operations:
//! - `copy_file` / `move_file`
//! - `copy_folder` / `move_folder` (in-place or via tree integration)
//! - `rename_folder`
//!
//! There is no rollback: a failure after a physical step leaves that step done.

mod file_copy;
mod file_move;
mod folder_copy;
mod folder_move;
mod folder_rename;
mod integrate;
pub mod naming;
mod target;

pub use integrate::IntegrationStats;
pub use naming::NameResolver;
pub use target::TargetFolder;

use std::rc::Rc;

use crate::catalog::Catalog;
use crate::errors::{RelocationError, Result};
use crate::hooks::{RelocationHooks, TracingHooks};
use crate::permissions::{AllowAll, PermissionGate};
use crate::resource::FolderHandle;
use crate::storage::{Storage, StorageRef};

pub struct Relocator {
    storage: StorageRef,
    catalog: Rc<dyn Catalog>,
    gate: Rc<dyn PermissionGate>,
    hooks: Rc<dyn RelocationHooks>,
    names: NameResolver,
}

impl Relocator {
    pub fn new(storage: StorageRef, catalog: Rc<dyn Catalog>) -> Self {
        Self {
            storage,
            catalog,
            gate: Rc::new(AllowAll),
            hooks: Rc::new(TracingHooks),
            names: NameResolver::new(),
        }
    }

    pub fn with_permissions(mut self, gate: Rc<dyn PermissionGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_hooks(mut self, hooks: Rc<dyn RelocationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_name_resolver(mut self, names: NameResolver) -> Self {
        self.names = names;
        self
    }

    pub fn storage(&self) -> &StorageRef {
        &self.storage
    }

    pub fn name_resolver(&self) -> &NameResolver {
        &self.names
    }

    fn ensure_own_folder(&self, folder: &FolderHandle) -> Result<()> {
        let storage = folder.storage();
        if Storage::same(&storage, &self.storage) {
            return Ok(());
        }
        Err(RelocationError::invalid(format!(
            "folder '{}' belongs to storage {}, this relocator writes to storage {}",
            folder.identifier(),
            storage.uid(),
            self.storage.uid()
        )))
    }

    /// Backend-specific clean-up of a user supplied name.
    fn sanitize(&self, name: &str) -> Result<String> {
        self.storage
            .driver()
            .sanitize_name(name)
            .map_err(|e| RelocationError::invalid(format!("invalid name '{name}': {e}")))
    }
}
