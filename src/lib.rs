//! Core library for `relocator`.
//!
//! Copies and moves files and folders within one storage or across two,
//! resolving name conflicts by policy and keeping a resource catalog in sync
//! with what the storage drivers did.
//!
//! Layout:
//! - `storage`: the `Driver` contract, `Storage` handles, local and in-memory drivers
//! - `resource`: shared file/folder handles that relocations update in place
//! - `catalog`: indexer/factory contracts and an in-memory catalog
//! - `relocate`: the engine (`Relocator`), name and target resolution, tree integration
//! - `config`, `platform`, `output`: ambient support for the binary

pub mod catalog;
pub mod config;
pub mod conflict;
pub mod errors;
pub mod hooks;
pub mod output;
pub mod permissions;
pub mod platform;
pub mod relocate;
pub mod resource;
pub mod storage;

pub use catalog::{Catalog, Indexer, MemoryCatalog, ResourceFactory};
pub use config::{Config, LogLevel, StorageConfig, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use conflict::ConflictMode;
pub use errors::{RelocationError, Result};
pub use hooks::{NoHooks, RelocationEvent, RelocationHooks, TracingHooks};
pub use permissions::{AllowAll, PermissionGate, WritableStorageGate};
pub use relocate::{NameResolver, Relocator, TargetFolder};
pub use resource::{FileHandle, FileKind, FolderHandle};
pub use storage::{Driver, LocalDriver, MemoryDriver, Storage, StorageRef};
