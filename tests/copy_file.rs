mod common;

use std::rc::Rc;

use relocator::{ConflictMode, MemoryCatalog, RelocationError, ResourceFactory, Storage, WritableStorageGate};
use relocator::MemoryDriver;
use tempfile::tempdir;

use common::{engine, file_exists, local_storage, memory_storage, read, write_file};

#[test]
fn cancel_with_existing_name_leaves_everything_untouched() {
    let s = memory_storage(1, &[("/in/a.txt", "new"), ("/out/a.txt", "old")]);
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&s, &catalog);
    let file = catalog.resolve(&s, "/in/a.txt").unwrap();
    let out = s.folder("/out/").unwrap();

    let err = engine.copy_file(&file, &out, None, ConflictMode::Cancel).unwrap_err();
    assert!(matches!(err, RelocationError::TargetExists { ref name, .. } if name == "a.txt"));
    assert_eq!(file.identifier(), "/in/a.txt");
    assert_eq!(read(&s, "/in/a.txt"), "new");
    assert_eq!(read(&s, "/out/a.txt"), "old");
    assert!(!file_exists(&s, "/out/a_01.txt"));
}

#[test]
fn default_policy_renames_and_catalogs_the_copy() {
    let s = memory_storage(1, &[("/in/a.txt", "new"), ("/out/a.txt", "old")]);
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&s, &catalog);
    let file = catalog.resolve(&s, "/in/a.txt").unwrap();
    let out = s.folder("/out/").unwrap();

    let copy = engine.copy_file(&file, &out, None, ConflictMode::FILE_DEFAULT).unwrap();
    assert_eq!(copy.identifier(), "/out/a_01.txt");
    assert_eq!(read(&s, "/out/a_01.txt"), "new");
    assert!(!copy.same_record(&file));
    assert!(catalog.get(1, "/out/a_01.txt").unwrap().same_record(&copy));
    assert_eq!(file.identifier(), "/in/a.txt");
}

#[test]
fn explicit_name_is_sanitized_by_the_driver() {
    let td = tempdir().unwrap();
    write_file(&td.path().join("in/a.txt"), "hello");
    std::fs::create_dir_all(td.path().join("out")).unwrap();
    let s = local_storage(1, td.path());
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&s, &catalog);
    let file = catalog.resolve(&s, "/in/a.txt").unwrap();
    let out = s.folder("/out/").unwrap();

    let copy = engine.copy_file(&file, &out, Some("b:c?.txt"), ConflictMode::Cancel).unwrap();
    assert_eq!(copy.identifier(), "/out/b_c_.txt");
    assert_eq!(std::fs::read_to_string(td.path().join("out/b_c_.txt")).unwrap(), "hello");
}

#[test]
fn cross_storage_copy_streams_through_local_copy() {
    let src = memory_storage(1, &[("/photos/cat.jpg", "meow")]);
    let td = tempdir().unwrap();
    std::fs::create_dir_all(td.path().join("backup")).unwrap();
    let dest = local_storage(2, td.path());
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&dest, &catalog);
    let file = catalog.resolve(&src, "/photos/cat.jpg").unwrap();
    let backup = dest.folder("/backup/").unwrap();

    let copy = engine.copy_file(&file, &backup, None, ConflictMode::RenameNewFile).unwrap();
    assert!(Storage::same(&copy.storage(), &dest));
    assert_eq!(copy.identifier(), "/backup/cat.jpg");
    assert_eq!(std::fs::read_to_string(td.path().join("backup/cat.jpg")).unwrap(), "meow");
    assert!(file_exists(&src, "/photos/cat.jpg"), "copy must keep the source");
}

#[test]
fn target_folder_must_belong_to_the_engine_storage() {
    let a = memory_storage(1, &[("/a.txt", "a")]);
    let b = Storage::new(2, "b", MemoryDriver::new());
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&a, &catalog);
    let file = catalog.resolve(&a, "/a.txt").unwrap();

    let err = engine.copy_file(&file, &b.root_folder(), None, ConflictMode::RenameNewFile).unwrap_err();
    assert!(matches!(err, RelocationError::InvalidOperation(_)), "got {err:?}");
}

#[test]
fn read_only_destination_is_refused_before_writing() {
    let src = memory_storage(1, &[("/a.txt", "a")]);
    let dest = Storage::read_only(2, "archive", MemoryDriver::new());
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&dest, &catalog).with_permissions(Rc::new(WritableStorageGate));
    let file = catalog.resolve(&src, "/a.txt").unwrap();

    let err = engine.copy_file(&file, &dest.root_folder(), None, ConflictMode::RenameNewFile).unwrap_err();
    assert!(matches!(err, RelocationError::PermissionDenied { .. }), "got {err:?}");
    assert!(!file_exists(&dest, "/a.txt"));
}
