//! Pre/post notifications around relocation operations.
//! Hooks are fire-and-forget: they cannot veto or fail an operation.

use tracing::debug;

use crate::resource::{FileHandle, FolderHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FileCopy,
    FileMove,
    FolderCopy,
    FolderMove,
    FolderRename,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::FileCopy => "copy-file",
            Operation::FileMove => "move-file",
            Operation::FolderCopy => "copy-folder",
            Operation::FolderMove => "move-folder",
            Operation::FolderRename => "rename-folder",
        }
    }
}

/// What is being relocated and where to.
#[derive(Debug, Clone)]
pub enum Subject<'a> {
    File {
        file: &'a FileHandle,
        target: &'a FolderHandle,
    },
    Folder {
        folder: &'a FolderHandle,
        target: &'a FolderHandle,
    },
    Rename {
        folder: &'a FolderHandle,
        new_name: &'a str,
    },
}

#[derive(Debug, Clone)]
pub struct RelocationEvent<'a> {
    pub operation: Operation,
    pub subject: Subject<'a>,
    /// The file's folder before a move; the post hook of a file move gets it here.
    pub original_parent: Option<&'a FolderHandle>,
}

impl<'a> RelocationEvent<'a> {
    pub fn file(operation: Operation, file: &'a FileHandle, target: &'a FolderHandle) -> Self {
        Self {
            operation,
            subject: Subject::File { file, target },
            original_parent: None,
        }
    }

    pub fn folder(operation: Operation, folder: &'a FolderHandle, target: &'a FolderHandle) -> Self {
        Self {
            operation,
            subject: Subject::Folder { folder, target },
            original_parent: None,
        }
    }

    pub fn rename(folder: &'a FolderHandle, new_name: &'a str) -> Self {
        Self {
            operation: Operation::FolderRename,
            subject: Subject::Rename { folder, new_name },
            original_parent: None,
        }
    }

    pub fn with_original_parent(mut self, parent: &'a FolderHandle) -> Self {
        self.original_parent = Some(parent);
        self
    }

    fn describe(&self) -> (String, String) {
        match &self.subject {
            Subject::File { file, target } => (file.identifier(), target.identifier()),
            Subject::Folder { folder, target } => (folder.identifier(), target.identifier()),
            Subject::Rename { folder, new_name } => (folder.identifier(), (*new_name).to_string()),
        }
    }
}

pub trait RelocationHooks {
    fn before(&self, _event: &RelocationEvent<'_>) {}
    fn after(&self, _event: &RelocationEvent<'_>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl RelocationHooks for NoHooks {}

/// Logs every event at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHooks;

impl RelocationHooks for TracingHooks {
    fn before(&self, event: &RelocationEvent<'_>) {
        let (subject, target) = event.describe();
        debug!(op = event.operation.as_str(), %subject, %target, "starting");
    }

    fn after(&self, event: &RelocationEvent<'_>) {
        let (subject, target) = event.describe();
        let original_parent = event.original_parent.map(|p| p.identifier());
        debug!(op = event.operation.as_str(), %subject, %target, ?original_parent, "finished");
    }
}
