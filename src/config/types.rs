//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - StorageConfig describes one local storage the binary can address by uid.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::conflict::ConflictMode;
use crate::storage::{LocalDriver, Storage, StorageRef};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Completed operations (default)
    #[default]
    Normal,
    /// Decisions: name resolution, in-place vs integration
    Info,
    /// Everything, including name probes
    Debug,
}

impl LogLevel {
    /// Parse common names (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        })
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// One `<storage>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub uid: u32,
    pub name: String,
    pub writable: bool,
    pub base_path: PathBuf,
}

impl StorageConfig {
    pub fn new(uid: u32, base_path: impl Into<PathBuf>) -> Self {
        Self {
            uid,
            name: format!("storage-{uid}"),
            writable: true,
            base_path: base_path.into(),
        }
    }
}

/// Runtime configuration used by the binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Copy timestamps and permission bits on local copies
    pub preserve_metadata: bool,
    /// Policy for file copies/moves when the CLI gives none
    pub file_conflict: ConflictMode,
    /// Policy for folder copies/moves when the CLI gives none
    pub folder_conflict: ConflictMode,
    pub storages: Vec<StorageConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            log_file: None,
            preserve_metadata: false,
            file_conflict: ConflictMode::FILE_DEFAULT,
            folder_conflict: ConflictMode::FOLDER_DEFAULT,
            storages: Vec::new(),
        }
    }
}

impl Config {
    pub fn storage(&self, uid: u32) -> Option<&StorageConfig> {
        self.storages.iter().find(|s| s.uid == uid)
    }

    /// Open every configured storage on a local driver, keyed by uid.
    pub fn open_storages(&self) -> BTreeMap<u32, StorageRef> {
        self.storages
            .iter()
            .map(|sc| {
                let driver = LocalDriver::new(&sc.base_path).with_preserve_metadata(self.preserve_metadata);
                let storage = if sc.writable {
                    Storage::new(sc.uid, sc.name.clone(), driver)
                } else {
                    Storage::read_only(sc.uid, sc.name.clone(), driver)
                };
                (sc.uid, storage)
            })
            .collect()
    }
}
