//! Local filesystem driver.
//! Maps identifiers onto a base directory. Copies stream into fresh files and
//! never clobber; renames fall back to copy+remove across mount points.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use super::helpers::io_error_with_help_io;
use super::identifier::{self, as_folder, file_in, folder_in};
use super::io_copy::{copy_streaming, copy_via_temp, is_cross_device, is_temp_name, preserve_metadata};
use super::{Driver, IdentifierMap, LocalCopy};

/// Headroom kept free on the destination volume when ingesting files.
const SPACE_CUSHION: u64 = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct LocalDriver {
    base: PathBuf,
    preserve_metadata: bool,
}

impl LocalDriver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            preserve_metadata: false,
        }
    }

    /// Copy timestamps and permission bits onto copied files.
    pub fn with_preserve_metadata(mut self, preserve: bool) -> Self {
        self.preserve_metadata = preserve;
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Absolute path for an identifier. Identifiers never leave the base.
    pub fn absolute(&self, id: &str) -> io::Result<PathBuf> {
        let mut path = self.base.clone();
        for comp in Path::new(id.trim_matches('/')).components() {
            match comp {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("identifier '{id}' escapes the storage base"),
                    ));
                }
            }
        }
        Ok(path)
    }

    fn metadata_of(&self, id: &str) -> io::Result<Option<fs::Metadata>> {
        match fs::metadata(self.absolute(id)?) {
            Ok(m) => Ok(Some(m)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn entries(&self, folder_id: &str, want_dirs: bool) -> io::Result<Vec<String>> {
        let dir = self.absolute(folder_id)?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(io_error_with_help_io("list folder", &dir))? {
            let entry = entry?;
            let is_dir = entry.file_type()?.is_dir();
            if is_dir != want_dirs {
                continue;
            }
            let name = entry.file_name().into_string().map_err(|raw| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("entry {raw:?} in folder '{folder_id}' has a non UTF-8 name"),
                )
            })?;
            if !is_temp_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names
            .into_iter()
            .map(|n| if want_dirs { folder_in(folder_id, &n) } else { file_in(folder_id, &n) })
            .collect())
    }

    fn copy_file_bytes(&self, src: &Path, dest: &Path, replace: bool) -> io::Result<()> {
        copy_via_temp(src, dest, replace).map_err(io_error_with_help_io("copy file", dest))?;
        if self.preserve_metadata {
            preserve_metadata(src, dest)?;
        }
        Ok(())
    }

    /// Old -> new identifiers for `src_id` and everything below it.
    fn tree_map(&self, src_id: &str, new_id: &str) -> io::Result<IdentifierMap> {
        let src_id = as_folder(src_id);
        let new_id = as_folder(new_id);
        let root = self.absolute(&src_id)?;
        let mut map = IdentifierMap::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let rel = relative_id(entry.path(), &root)?;
            if rel.is_empty() {
                map.insert(src_id.clone(), new_id.clone());
            } else if entry.file_type().is_dir() {
                map.insert(format!("{src_id}{rel}/"), format!("{new_id}{rel}/"));
            } else {
                map.insert(format!("{src_id}{rel}"), format!("{new_id}{rel}"));
            }
        }
        Ok(map)
    }

    fn copy_tree(&self, src: &Path, dest: &Path) -> io::Result<()> {
        for entry in WalkDir::new(src).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let rel = entry
                .path()
                .strip_prefix(src)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let target = dest.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(io_error_with_help_io("create folder", &target))?;
            } else {
                copy_streaming(entry.path(), &target).map_err(io_error_with_help_io("copy file", &target))?;
                if self.preserve_metadata {
                    preserve_metadata(entry.path(), &target)?;
                }
            }
        }
        Ok(())
    }

    fn relocate_tree(&self, src_id: &str, new_id: &str) -> io::Result<IdentifierMap> {
        let src = self.absolute(src_id)?;
        let dest = self.absolute(new_id)?;
        if fs::symlink_metadata(&dest).is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("folder '{new_id}' already exists"),
            ));
        }
        let map = self.tree_map(src_id, new_id)?;
        match fs::rename(&src, &dest) {
            Ok(()) => {}
            Err(e) if is_cross_device(&e) => {
                warn!(error = %e, src = %src.display(), "atomic folder rename failed, copying tree instead");
                self.copy_tree(&src, &dest)?;
                fs::remove_dir_all(&src).map_err(io_error_with_help_io("remove source folder", &src))?;
            }
            Err(e) => return Err(io_error_with_help_io("rename folder", &src)(e)),
        }
        debug!(src = src_id, dest = new_id, entries = map.len(), "relocated folder tree");
        Ok(map)
    }
}

/// Slash separated path of `path` relative to `root` ("" for the root itself).
fn relative_id(path: &Path, root: &Path) -> io::Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut parts = Vec::new();
    for comp in rel.components() {
        if let Component::Normal(part) = comp {
            let part = part.to_str().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, format!("non UTF-8 name below {}", root.display()))
            })?;
            parts.push(part);
        }
    }
    Ok(parts.join("/"))
}

impl Driver for LocalDriver {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn sanitize_name(&self, name: &str) -> io::Result<String> {
        let replaced: String = name
            .chars()
            .map(|c| {
                if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                    '_'
                } else {
                    c
                }
            })
            .collect();
        let cleaned = replaced.trim().trim_end_matches('.').trim_end();
        if cleaned.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("name '{name}' is empty after sanitizing"),
            ));
        }
        if cleaned != name {
            trace!(original = name, sanitized = cleaned, "sanitized name");
        }
        Ok(cleaned.to_string())
    }

    fn file_exists(&self, name: &str, folder_id: &str) -> io::Result<bool> {
        self.file_exists_at(&file_in(folder_id, name))
    }

    fn folder_exists(&self, name: &str, folder_id: &str) -> io::Result<bool> {
        self.folder_exists_at(&folder_in(folder_id, name))
    }

    fn file_exists_at(&self, id: &str) -> io::Result<bool> {
        Ok(self.metadata_of(id)?.is_some_and(|m| m.is_file()))
    }

    fn folder_exists_at(&self, id: &str) -> io::Result<bool> {
        Ok(self.metadata_of(id)?.is_some_and(|m| m.is_dir()))
    }

    fn files_in_folder(&self, folder_id: &str) -> io::Result<Vec<String>> {
        self.entries(folder_id, false)
    }

    fn folders_in_folder(&self, folder_id: &str) -> io::Result<Vec<String>> {
        self.entries(folder_id, true)
    }

    fn create_folder(&self, name: &str, parent_id: &str) -> io::Result<String> {
        let id = folder_in(parent_id, name);
        let path = self.absolute(&id)?;
        fs::create_dir(&path).map_err(io_error_with_help_io("create folder", &path))?;
        Ok(id)
    }

    fn delete_folder(&self, id: &str, recursive: bool) -> io::Result<()> {
        if as_folder(id) == identifier::ROOT {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "refusing to delete the storage root"));
        }
        let path = self.absolute(id)?;
        if recursive {
            fs::remove_dir_all(&path).map_err(io_error_with_help_io("delete folder", &path))
        } else {
            fs::remove_dir(&path).map_err(io_error_with_help_io("delete folder", &path))
        }
    }

    fn copy_file_within_storage(&self, src_id: &str, dest_folder_id: &str, name: &str) -> io::Result<String> {
        let id = file_in(dest_folder_id, name);
        self.copy_file_bytes(&self.absolute(src_id)?, &self.absolute(&id)?, false)?;
        Ok(id)
    }

    fn move_file_within_storage(&self, src_id: &str, dest_folder_id: &str, name: &str) -> io::Result<String> {
        let id = file_in(dest_folder_id, name);
        let src = self.absolute(src_id)?;
        let dest = self.absolute(&id)?;
        if fs::symlink_metadata(&dest).is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file '{id}' already exists"),
            ));
        }
        match fs::rename(&src, &dest) {
            Ok(()) => {}
            Err(e) if is_cross_device(&e) => {
                warn!(error = %e, "atomic rename failed, using copy+remove");
                self.copy_file_bytes(&src, &dest, false)?;
                fs::remove_file(&src).map_err(io_error_with_help_io("remove original file", &src))?;
            }
            Err(e) => return Err(io_error_with_help_io("rename file", &src)(e)),
        }
        Ok(id)
    }

    fn add_file(&self, local: &Path, dest_folder_id: &str, name: &str, allow_overwrite: bool) -> io::Result<String> {
        let id = file_in(dest_folder_id, name);
        let dest = self.absolute(&id)?;
        let dest_dir = self.absolute(dest_folder_id)?;
        let required = fs::metadata(local)?.len();
        let free = fs2::available_space(&dest_dir)?;
        if free < required.saturating_add(SPACE_CUSHION) {
            return Err(io::Error::new(
                io::ErrorKind::StorageFull,
                format!(
                    "not enough free space in '{}': need {} bytes, free {} bytes",
                    dest_dir.display(),
                    required,
                    free
                ),
            ));
        }
        self.copy_file_bytes(local, &dest, allow_overwrite)?;
        Ok(id)
    }

    fn delete_file(&self, id: &str) -> io::Result<()> {
        let path = self.absolute(id)?;
        fs::remove_file(&path).map_err(io_error_with_help_io("delete file", &path))
    }

    fn local_copy(&self, id: &str) -> io::Result<LocalCopy> {
        if !self.file_exists_at(id)? {
            return Err(io::Error::new(io::ErrorKind::NotFound, format!("file '{id}' not found")));
        }
        Ok(LocalCopy::InPlace(self.absolute(id)?))
    }

    fn file_contents(&self, id: &str) -> io::Result<Vec<u8>> {
        let path = self.absolute(id)?;
        fs::read(&path).map_err(io_error_with_help_io("read file", &path))
    }

    fn copy_folder_within_storage(&self, src_id: &str, dest_parent_id: &str, name: &str) -> io::Result<()> {
        let dest = self.absolute(&folder_in(dest_parent_id, name))?;
        if fs::symlink_metadata(&dest).is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("folder '{}' already exists", dest.display()),
            ));
        }
        self.copy_tree(&self.absolute(src_id)?, &dest)
    }

    fn move_folder_within_storage(&self, src_id: &str, dest_parent_id: &str, name: &str) -> io::Result<IdentifierMap> {
        self.relocate_tree(src_id, &folder_in(dest_parent_id, name))
    }

    fn rename_folder(&self, id: &str, new_name: &str) -> io::Result<IdentifierMap> {
        if as_folder(id) == identifier::ROOT {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "the storage root cannot be renamed"));
        }
        let parent = identifier::parent_of(id);
        self.relocate_tree(id, &folder_in(&parent, new_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn driver_with_tree() -> (tempfile::TempDir, LocalDriver) {
        let td = tempdir().unwrap();
        let base = td.path();
        fs::create_dir_all(base.join("docs/sub")).unwrap();
        fs::write(base.join("docs/a.txt"), b"a").unwrap();
        fs::write(base.join("docs/sub/b.txt"), b"b").unwrap();
        let driver = LocalDriver::new(base);
        (td, driver)
    }

    #[test]
    fn sanitize_replaces_separators_and_trims_dots() {
        let d = LocalDriver::new("/tmp");
        assert_eq!(d.sanitize_name("a/b:c.txt").unwrap(), "a_b_c.txt");
        assert_eq!(d.sanitize_name(" report.. ").unwrap(), "report");
        assert_eq!(d.sanitize_name("..").unwrap_err().kind(), io::ErrorKind::InvalidInput);
        assert_eq!(d.sanitize_name("  ").unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn listing_is_sorted_and_typed() {
        let (_td, d) = driver_with_tree();
        assert_eq!(d.folders_in_folder("/").unwrap(), vec!["/docs/"]);
        assert_eq!(d.files_in_folder("/docs/").unwrap(), vec!["/docs/a.txt"]);
        assert_eq!(d.folders_in_folder("/docs/").unwrap(), vec!["/docs/sub/"]);
        assert!(d.file_exists("a.txt", "/docs/").unwrap());
        assert!(!d.folder_exists("a.txt", "/docs/").unwrap());
    }

    #[test]
    fn move_folder_reports_full_mapping() {
        let (td, d) = driver_with_tree();
        d.create_folder("archive", "/").unwrap();
        let map = d.move_folder_within_storage("/docs/", "/archive/", "docs").unwrap();
        assert_eq!(map.get("/docs/").map(String::as_str), Some("/archive/docs/"));
        assert_eq!(map.get("/docs/a.txt").map(String::as_str), Some("/archive/docs/a.txt"));
        assert_eq!(map.get("/docs/sub/").map(String::as_str), Some("/archive/docs/sub/"));
        assert_eq!(map.get("/docs/sub/b.txt").map(String::as_str), Some("/archive/docs/sub/b.txt"));
        assert!(td.path().join("archive/docs/sub/b.txt").is_file());
        assert!(!td.path().join("docs").exists());
    }

    #[test]
    fn rename_folder_keeps_parent() {
        let (td, d) = driver_with_tree();
        let map = d.rename_folder("/docs/sub/", "renamed").unwrap();
        assert_eq!(map.get("/docs/sub/b.txt").map(String::as_str), Some("/docs/renamed/b.txt"));
        assert_eq!(fs::read(td.path().join("docs/renamed/b.txt")).unwrap(), b"b");
    }

    #[test]
    fn copy_folder_refuses_existing_target() {
        let (td, d) = driver_with_tree();
        d.copy_folder_within_storage("/docs/", "/", "copy").unwrap();
        assert!(td.path().join("copy/sub/b.txt").is_file());
        let err = d.copy_folder_within_storage("/docs/", "/", "copy").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn add_file_never_clobbers_without_permission() {
        let (td, d) = driver_with_tree();
        let outside = tempdir().unwrap();
        let local = outside.path().join("incoming.txt");
        fs::write(&local, b"incoming").unwrap();

        let err = d.add_file(&local, "/docs/", "a.txt", false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(td.path().join("docs/a.txt")).unwrap(), b"a");

        let id = d.add_file(&local, "/docs/", "a.txt", true).unwrap();
        assert_eq!(id, "/docs/a.txt");
        assert_eq!(fs::read(td.path().join("docs/a.txt")).unwrap(), b"incoming");
        assert!(local.exists(), "ingestion must not consume the local copy");
    }

    #[test]
    fn identifiers_cannot_escape_the_base() {
        let (td, d) = driver_with_tree();
        fs::write(td.path().join("docs/secret.txt"), b"s").unwrap();
        let inner = LocalDriver::new(td.path().join("docs/sub"));

        assert_eq!(inner.absolute("/b.txt").unwrap(), td.path().join("docs/sub/b.txt"));
        assert_eq!(inner.absolute("/").unwrap(), td.path().join("docs/sub"));
        for id in ["/../secret.txt", "/x/../../secret.txt", "/../"] {
            assert_eq!(inner.absolute(id).unwrap_err().kind(), io::ErrorKind::InvalidInput, "{id}");
        }
        assert_eq!(inner.file_exists_at("/../secret.txt").unwrap_err().kind(), io::ErrorKind::InvalidInput);
        assert!(inner.local_copy("/../secret.txt").is_err());
        assert!(d.file_exists_at("/docs/secret.txt").unwrap());
    }

    #[test]
    fn listing_hides_only_our_temp_files() {
        let (td, d) = driver_with_tree();
        fs::write(td.path().join("docs/.relocator.notes"), b"n").unwrap();
        fs::write(td.path().join("docs/.relocator.41.1700000000.tmp"), b"t").unwrap();
        assert_eq!(d.files_in_folder("/docs/").unwrap(), vec!["/docs/.relocator.notes", "/docs/a.txt"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_fail_the_listing() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (td, d) = driver_with_tree();
        fs::write(td.path().join("docs").join(OsStr::from_bytes(b"bad\xff.txt")), b"x").unwrap();
        assert_eq!(d.files_in_folder("/docs/").unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn root_cannot_be_deleted_or_renamed() {
        let (_td, d) = driver_with_tree();
        assert_eq!(d.delete_folder("/", true).unwrap_err().kind(), io::ErrorKind::InvalidInput);
        assert_eq!(d.rename_folder("/", "x").unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }
}
