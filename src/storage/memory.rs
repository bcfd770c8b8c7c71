//! In-memory object store driver.
//! Keeps folders as a set of identifiers and files as byte blobs. Its
//! local-processing representation is a temporary file on disk.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use super::identifier::{self, as_file, as_folder, file_in, folder_in, is_within, rebase};
use super::{Driver, IdentifierMap, LocalCopy};

#[derive(Debug, Default)]
struct Objects {
    folders: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug)]
pub struct MemoryDriver {
    objects: RefCell<Objects>,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDriver {
    pub fn new() -> Self {
        let mut objects = Objects::default();
        objects.folders.insert(identifier::ROOT.to_string());
        Self {
            objects: RefCell::new(objects),
        }
    }

    /// Seed a file, creating missing parent folders.
    pub fn with_file(self, id: &str, contents: impl Into<Vec<u8>>) -> Self {
        let id = as_file(id);
        {
            let mut objects = self.objects.borrow_mut();
            let mut parent = identifier::parent_of(&id);
            while objects.folders.insert(parent.clone()) {
                parent = identifier::parent_of(&parent);
            }
            objects.files.insert(id, contents.into());
        }
        self
    }

    fn ensure_folder(&self, id: &str) -> io::Result<()> {
        if self.objects.borrow().folders.contains(id) {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    fn ensure_free(&self, id: &str) -> io::Result<()> {
        let objects = self.objects.borrow();
        let file_id = as_file(id);
        let folder_id = as_folder(id);
        if objects.files.contains_key(&file_id) || objects.folders.contains(&folder_id) {
            Err(io::Error::new(io::ErrorKind::AlreadyExists, format!("'{id}' already exists")))
        } else {
            Ok(())
        }
    }

    fn children(&self, folder_id: &str, folders: bool) -> io::Result<Vec<String>> {
        let folder_id = as_folder(folder_id);
        self.ensure_folder(&folder_id)?;
        let objects = self.objects.borrow();
        let direct = |id: &&String| -> bool {
            id.as_str() != folder_id && identifier::parent_of(id) == folder_id
        };
        let out = if folders {
            objects.folders.iter().filter(direct).cloned().collect()
        } else {
            objects.files.keys().filter(direct).cloned().collect()
        };
        Ok(out)
    }

    fn relocate_tree(&self, src_id: &str, new_id: &str, keep_source: bool) -> io::Result<IdentifierMap> {
        let src_id = as_folder(src_id);
        let new_id = as_folder(new_id);
        self.ensure_folder(&src_id)?;
        self.ensure_folder(&identifier::parent_of(&new_id))?;
        self.ensure_free(&new_id)?;

        let mut objects = self.objects.borrow_mut();
        let folders: Vec<String> = objects
            .folders
            .iter()
            .filter(|id| is_within(id, &src_id))
            .cloned()
            .collect();
        let files: Vec<String> = objects
            .files
            .keys()
            .filter(|id| is_within(id, &src_id))
            .cloned()
            .collect();

        let mut map = IdentifierMap::new();
        for old in folders {
            let new = rebase(&old, &src_id, &new_id).unwrap_or_else(|| new_id.clone());
            if !keep_source {
                objects.folders.remove(&old);
            }
            objects.folders.insert(new.clone());
            map.insert(old, new);
        }
        for old in files {
            let new = rebase(&old, &src_id, &new_id).unwrap_or_else(|| new_id.clone());
            let bytes = if keep_source {
                objects.files.get(&old).cloned().unwrap_or_default()
            } else {
                objects.files.remove(&old).unwrap_or_default()
            };
            objects.files.insert(new.clone(), bytes);
            map.insert(old, new);
        }
        Ok(map)
    }

    fn put_file(&self, id: String, bytes: Vec<u8>) {
        self.objects.borrow_mut().files.insert(id, bytes);
    }
}

fn not_found(id: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("'{id}' not found"))
}

impl Driver for MemoryDriver {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn sanitize_name(&self, name: &str) -> io::Result<String> {
        let cleaned: String = name
            .trim()
            .chars()
            .map(|c| if c == '/' || c.is_control() { '_' } else { c })
            .collect();
        if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("invalid name '{name}'")));
        }
        Ok(cleaned)
    }

    fn file_exists(&self, name: &str, folder_id: &str) -> io::Result<bool> {
        self.file_exists_at(&file_in(folder_id, name))
    }

    fn folder_exists(&self, name: &str, folder_id: &str) -> io::Result<bool> {
        self.folder_exists_at(&folder_in(folder_id, name))
    }

    fn file_exists_at(&self, id: &str) -> io::Result<bool> {
        Ok(!identifier::is_folder(id) && self.objects.borrow().files.contains_key(id))
    }

    fn folder_exists_at(&self, id: &str) -> io::Result<bool> {
        Ok(self.objects.borrow().folders.contains(&as_folder(id)))
    }

    fn files_in_folder(&self, folder_id: &str) -> io::Result<Vec<String>> {
        self.children(folder_id, false)
    }

    fn folders_in_folder(&self, folder_id: &str) -> io::Result<Vec<String>> {
        self.children(folder_id, true)
    }

    fn create_folder(&self, name: &str, parent_id: &str) -> io::Result<String> {
        self.ensure_folder(&as_folder(parent_id))?;
        let id = folder_in(parent_id, name);
        self.ensure_free(&id)?;
        self.objects.borrow_mut().folders.insert(id.clone());
        Ok(id)
    }

    fn delete_folder(&self, id: &str, recursive: bool) -> io::Result<()> {
        let id = as_folder(id);
        if id == identifier::ROOT {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "refusing to delete the storage root"));
        }
        self.ensure_folder(&id)?;
        let mut objects = self.objects.borrow_mut();
        let has_children = objects.folders.iter().any(|f| *f != id && is_within(f, &id))
            || objects.files.keys().any(|f| is_within(f, &id));
        if has_children && !recursive {
            return Err(io::Error::new(io::ErrorKind::DirectoryNotEmpty, format!("folder '{id}' is not empty")));
        }
        objects.folders.retain(|f| !is_within(f, &id));
        objects.files.retain(|f, _| !is_within(f, &id));
        Ok(())
    }

    fn copy_file_within_storage(&self, src_id: &str, dest_folder_id: &str, name: &str) -> io::Result<String> {
        let bytes = self.file_contents(src_id)?;
        self.ensure_folder(&as_folder(dest_folder_id))?;
        let id = file_in(dest_folder_id, name);
        self.ensure_free(&id)?;
        self.put_file(id.clone(), bytes);
        Ok(id)
    }

    fn move_file_within_storage(&self, src_id: &str, dest_folder_id: &str, name: &str) -> io::Result<String> {
        let id = self.copy_file_within_storage(src_id, dest_folder_id, name)?;
        self.objects.borrow_mut().files.remove(src_id);
        Ok(id)
    }

    fn add_file(&self, local: &Path, dest_folder_id: &str, name: &str, allow_overwrite: bool) -> io::Result<String> {
        self.ensure_folder(&as_folder(dest_folder_id))?;
        let id = file_in(dest_folder_id, name);
        if !allow_overwrite {
            self.ensure_free(&id)?;
        }
        let bytes = fs::read(local)?;
        self.put_file(id.clone(), bytes);
        Ok(id)
    }

    fn delete_file(&self, id: &str) -> io::Result<()> {
        self.objects
            .borrow_mut()
            .files
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    fn local_copy(&self, id: &str) -> io::Result<LocalCopy> {
        let bytes = self.file_contents(id)?;
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        Ok(LocalCopy::Temporary(tmp))
    }

    fn file_contents(&self, id: &str) -> io::Result<Vec<u8>> {
        self.objects
            .borrow()
            .files
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn copy_folder_within_storage(&self, src_id: &str, dest_parent_id: &str, name: &str) -> io::Result<()> {
        self.relocate_tree(src_id, &folder_in(dest_parent_id, name), true)
            .map(|_| ())
    }

    fn move_folder_within_storage(&self, src_id: &str, dest_parent_id: &str, name: &str) -> io::Result<IdentifierMap> {
        self.relocate_tree(src_id, &folder_in(dest_parent_id, name), false)
    }

    fn rename_folder(&self, id: &str, new_name: &str) -> io::Result<IdentifierMap> {
        if as_folder(id) == identifier::ROOT {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "the storage root cannot be renamed"));
        }
        let parent = identifier::parent_of(id);
        self.relocate_tree(id, &folder_in(&parent, new_name), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryDriver {
        MemoryDriver::new()
            .with_file("/docs/a.txt", "a")
            .with_file("/docs/sub/b.txt", "b")
    }

    #[test]
    fn seeding_creates_parent_folders() {
        let d = seeded();
        assert!(d.folder_exists_at("/docs/").unwrap());
        assert!(d.folder_exists_at("/docs/sub/").unwrap());
        assert_eq!(d.folders_in_folder("/").unwrap(), vec!["/docs/"]);
        assert_eq!(d.files_in_folder("/docs/").unwrap(), vec!["/docs/a.txt"]);
    }

    #[test]
    fn move_folder_maps_every_entry() {
        let d = seeded();
        d.create_folder("dst", "/").unwrap();
        let map = d.move_folder_within_storage("/docs/", "/dst/", "moved").unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map["/docs/sub/b.txt"], "/dst/moved/sub/b.txt");
        assert!(!d.folder_exists_at("/docs/").unwrap());
        assert_eq!(d.file_contents("/dst/moved/sub/b.txt").unwrap(), b"b");
    }

    #[test]
    fn copy_folder_keeps_source() {
        let d = seeded();
        d.copy_folder_within_storage("/docs/", "/", "copy").unwrap();
        assert!(d.file_exists_at("/docs/a.txt").unwrap());
        assert!(d.file_exists_at("/copy/sub/b.txt").unwrap());
    }

    #[test]
    fn local_copy_is_a_readable_temp_file() {
        let d = seeded();
        let copy = d.local_copy("/docs/a.txt").unwrap();
        assert_eq!(fs::read(copy.path()).unwrap(), b"a");
    }

    #[test]
    fn non_recursive_delete_refuses_full_folder() {
        let d = seeded();
        assert!(d.delete_folder("/docs/", false).is_err());
        d.delete_folder("/docs/", true).unwrap();
        assert!(d.files_in_folder("/").unwrap().is_empty());
        assert!(!d.file_exists_at("/docs/sub/b.txt").unwrap());
    }
}
