//! Resource handles.
//!
//! A handle is a shared, updatable record: every clone sees relocations made
//! through any other clone. Relocation mutates `identifier`, `name` and
//! `storage` in place; callers never have to swap their references.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::errors::Result;
use crate::storage::identifier::{self, as_file, as_folder};
use crate::storage::{StorageRef, backend_error};

#[derive(Debug)]
struct Record {
    identifier: String,
    name: String,
    storage: StorageRef,
    deleted: bool,
}

impl Record {
    fn new(storage: StorageRef, identifier: String) -> Self {
        let name = identifier::name_of(&identifier).to_string();
        Self {
            identifier,
            name,
            storage,
            deleted: false,
        }
    }

    fn relocate(&mut self, identifier: String, storage: StorageRef) {
        self.name = identifier::name_of(&identifier).to_string();
        self.identifier = identifier;
        self.storage = storage;
    }
}

/// What a file handle stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A regular, cataloged file.
    Original,
    /// A derivative (thumbnail, rendition) with the same relocation contract.
    Processed,
    /// A usage reference to a file; copyable, but never relocated itself.
    Reference,
}

impl FileKind {
    pub fn is_relocatable(self) -> bool {
        !matches!(self, FileKind::Reference)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Original => "file",
            FileKind::Processed => "processed file",
            FileKind::Reference => "file reference",
        }
    }
}

#[derive(Clone)]
pub struct FileHandle {
    record: Rc<RefCell<Record>>,
    kind: FileKind,
}

impl FileHandle {
    pub fn new(storage: StorageRef, id: &str, kind: FileKind) -> Self {
        Self {
            record: Rc::new(RefCell::new(Record::new(storage, as_file(id)))),
            kind,
        }
    }

    pub fn identifier(&self) -> String {
        self.record.borrow().identifier.clone()
    }

    pub fn name(&self) -> String {
        self.record.borrow().name.clone()
    }

    pub fn storage(&self) -> StorageRef {
        Rc::clone(&self.record.borrow().storage)
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_deleted(&self) -> bool {
        self.record.borrow().deleted
    }

    pub fn mark_deleted(&self) {
        self.record.borrow_mut().deleted = true;
    }

    /// Both handles share one record.
    pub fn same_record(&self, other: &FileHandle) -> bool {
        Rc::ptr_eq(&self.record, &other.record)
    }

    /// Folder currently holding the file.
    pub fn parent_folder(&self) -> FolderHandle {
        let record = self.record.borrow();
        FolderHandle::new(Rc::clone(&record.storage), &identifier::parent_of(&record.identifier))
    }

    pub fn contents(&self) -> Result<Vec<u8>> {
        let id = self.identifier();
        self.storage()
            .driver()
            .file_contents(&id)
            .map_err(backend_error("read file", &id))
    }

    pub(crate) fn relocate(&self, identifier: String, storage: StorageRef) {
        self.record.borrow_mut().relocate(as_file(&identifier), storage);
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record.borrow();
        f.debug_struct("FileHandle")
            .field("identifier", &record.identifier)
            .field("storage", &record.storage.uid())
            .field("kind", &self.kind)
            .field("deleted", &record.deleted)
            .finish()
    }
}

#[derive(Clone)]
pub struct FolderHandle {
    record: Rc<RefCell<Record>>,
}

impl FolderHandle {
    pub fn new(storage: StorageRef, id: &str) -> Self {
        Self {
            record: Rc::new(RefCell::new(Record::new(storage, as_folder(id)))),
        }
    }

    pub fn identifier(&self) -> String {
        self.record.borrow().identifier.clone()
    }

    /// Last path segment; empty for a storage root.
    pub fn name(&self) -> String {
        self.record.borrow().name.clone()
    }

    pub fn storage(&self) -> StorageRef {
        Rc::clone(&self.record.borrow().storage)
    }

    pub fn is_root(&self) -> bool {
        self.record.borrow().identifier == identifier::ROOT
    }

    pub fn is_deleted(&self) -> bool {
        self.record.borrow().deleted
    }

    pub fn same_record(&self, other: &FolderHandle) -> bool {
        Rc::ptr_eq(&self.record, &other.record)
    }

    pub fn parent_folder(&self) -> FolderHandle {
        let record = self.record.borrow();
        FolderHandle::new(Rc::clone(&record.storage), &identifier::parent_of(&record.identifier))
    }

    pub fn has_file(&self, name: &str) -> Result<bool> {
        let id = self.identifier();
        self.storage()
            .driver()
            .file_exists(name, &id)
            .map_err(backend_error("check file", &id))
    }

    pub fn has_folder(&self, name: &str) -> Result<bool> {
        let id = self.identifier();
        self.storage()
            .driver()
            .folder_exists(name, &id)
            .map_err(backend_error("check folder", &id))
    }

    /// A file or a folder with this name exists here.
    pub fn has_entry(&self, name: &str) -> Result<bool> {
        Ok(self.has_file(name)? || self.has_folder(name)?)
    }

    pub fn subfolder(&self, name: &str) -> Result<FolderHandle> {
        self.storage().folder(&identifier::folder_in(&self.identifier(), name))
    }

    pub fn subfolders(&self) -> Result<Vec<FolderHandle>> {
        let id = self.identifier();
        let storage = self.storage();
        let ids = storage
            .driver()
            .folders_in_folder(&id)
            .map_err(backend_error("list folders", &id))?;
        Ok(ids
            .iter()
            .map(|sub| FolderHandle::new(Rc::clone(&storage), sub))
            .collect())
    }

    /// File identifiers directly inside this folder.
    pub fn file_identifiers(&self) -> Result<Vec<String>> {
        let id = self.identifier();
        self.storage()
            .driver()
            .files_in_folder(&id)
            .map_err(backend_error("list files", &id))
    }

    pub fn create_folder(&self, name: &str) -> Result<FolderHandle> {
        let id = self.identifier();
        let storage = self.storage();
        let new_id = storage
            .driver()
            .create_folder(name, &id)
            .map_err(backend_error("create folder", &id))?;
        Ok(FolderHandle::new(storage, &new_id))
    }

    pub(crate) fn relocate(&self, identifier: String, storage: StorageRef) {
        self.record.borrow_mut().relocate(as_folder(&identifier), storage);
    }

    pub(crate) fn mark_deleted(&self) {
        self.record.borrow_mut().deleted = true;
    }
}

impl fmt::Debug for FolderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record.borrow();
        f.debug_struct("FolderHandle")
            .field("identifier", &record.identifier)
            .field("storage", &record.storage.uid())
            .field("deleted", &record.deleted)
            .finish()
    }
}
