#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use relocator::{LocalDriver, MemoryCatalog, MemoryDriver, NameResolver, Relocator, Storage, StorageRef};

/// Seed for the random-suffix branch of name resolution.
pub const SEED: u64 = 42;

/// In-memory storage seeded with `(identifier, contents)` pairs.
pub fn memory_storage(uid: u32, files: &[(&str, &str)]) -> StorageRef {
    let driver = files
        .iter()
        .fold(MemoryDriver::new(), |d, (id, body)| d.with_file(id, *body));
    Storage::new(uid, format!("memory-{uid}"), driver)
}

pub fn local_storage(uid: u32, base: &Path) -> StorageRef {
    Storage::new(uid, format!("local-{uid}"), LocalDriver::new(base))
}

/// Engine writing into `storage` with a deterministic name resolver.
pub fn engine(storage: &StorageRef, catalog: &Rc<MemoryCatalog>) -> Relocator {
    Relocator::new(Rc::clone(storage), catalog.clone()).with_name_resolver(NameResolver::seeded(SEED))
}

/// Create a file with the given content and fsync it.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    let mut f = fs::File::create(path).expect("create file");
    write!(f, "{contents}").expect("write content");
    f.sync_all().expect("sync file");
}

/// Contents of a file on `storage`, as UTF-8.
pub fn read(storage: &StorageRef, id: &str) -> String {
    let bytes = storage.driver().file_contents(id).expect("read file");
    String::from_utf8(bytes).expect("utf-8 content")
}

pub fn file_exists(storage: &StorageRef, id: &str) -> bool {
    storage.driver().file_exists_at(id).expect("check file")
}

pub fn folder_exists(storage: &StorageRef, id: &str) -> bool {
    storage.driver().folder_exists_at(id).expect("check folder")
}
