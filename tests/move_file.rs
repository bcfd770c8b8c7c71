mod common;

use std::cell::RefCell;
use std::rc::Rc;

use relocator::hooks::{Operation, RelocationEvent, RelocationHooks};
use relocator::{ConflictMode, FileHandle, FileKind, MemoryCatalog, RelocationError, ResourceFactory, Storage};
use tempfile::tempdir;

use common::{engine, file_exists, local_storage, memory_storage, read, write_file};

/// Records `(operation, phase, original parent)` for every event.
#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<(Operation, &'static str, Option<String>)>>,
}

impl RelocationHooks for Recorder {
    fn before(&self, event: &RelocationEvent<'_>) {
        self.events.borrow_mut().push((event.operation, "before", None));
    }

    fn after(&self, event: &RelocationEvent<'_>) {
        let parent = event.original_parent.map(|p| p.identifier());
        self.events.borrow_mut().push((event.operation, "after", parent));
    }
}

#[test]
fn cross_storage_move_removes_the_source() {
    let src = memory_storage(1, &[("/inbox/report.pdf", "pdf")]);
    let dest = memory_storage(2, &[("/archive/keep.txt", "k")]);
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&dest, &catalog);
    let file = catalog.resolve(&src, "/inbox/report.pdf").unwrap();
    let alias = file.clone();

    engine
        .move_file(&file, &dest.folder("/archive/").unwrap(), None, ConflictMode::RenameNewFile, true)
        .unwrap();

    assert_eq!(file.identifier(), "/archive/report.pdf");
    assert!(Storage::same(&file.storage(), &dest));
    assert!(file_exists(&dest, "/archive/report.pdf"));
    assert!(!file_exists(&src, "/inbox/report.pdf"));
    assert_eq!(read(&dest, "/archive/report.pdf"), "pdf");
    // Every clone of the handle observes the relocation.
    assert_eq!(alias.identifier(), "/archive/report.pdf");
    assert!(catalog.get(2, "/archive/report.pdf").unwrap().same_record(&file));
    assert!(catalog.get(1, "/inbox/report.pdf").is_none());
}

#[test]
fn keep_original_copies_and_follows_the_new_file() {
    let src = memory_storage(1, &[("/a.txt", "a")]);
    let dest = memory_storage(2, &[("/d/a.txt", "taken")]);
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&dest, &catalog);
    let file = catalog.resolve(&src, "/a.txt").unwrap();

    engine
        .move_file(&file, &dest.folder("/d/").unwrap(), None, ConflictMode::RenameNewFile, false)
        .unwrap();

    assert_eq!(file.identifier(), "/d/a_01.txt");
    assert!(file_exists(&src, "/a.txt"));
    assert_eq!(read(&dest, "/d/a.txt"), "taken");
    assert_eq!(read(&dest, "/d/a_01.txt"), "a");
}

#[test]
fn same_storage_move_on_disk() {
    let td = tempdir().unwrap();
    write_file(&td.path().join("incoming/movie.mkv"), "frames");
    std::fs::create_dir_all(td.path().join("library")).unwrap();
    let s = local_storage(1, td.path());
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&s, &catalog);
    let file = catalog.resolve(&s, "/incoming/movie.mkv").unwrap();

    engine.move_file_to(&file, &s.folder("/library/").unwrap()).unwrap();

    assert_eq!(file.identifier(), "/library/movie.mkv");
    assert!(!td.path().join("incoming/movie.mkv").exists());
    assert_eq!(std::fs::read_to_string(td.path().join("library/movie.mkv")).unwrap(), "frames");
}

#[test]
fn cancel_refuses_a_taken_name() {
    let s = memory_storage(1, &[("/in/a.txt", "new"), ("/out/a.txt", "old")]);
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&s, &catalog);
    let file = catalog.resolve(&s, "/in/a.txt").unwrap();

    let err = engine
        .move_file(&file, &s.folder("/out/").unwrap(), None, ConflictMode::Cancel, true)
        .unwrap_err();
    assert!(matches!(err, RelocationError::TargetExists { .. }), "got {err:?}");
    assert_eq!(file.identifier(), "/in/a.txt");
    assert!(file_exists(&s, "/in/a.txt"));
}

#[test]
fn references_never_move() {
    let s = memory_storage(1, &[("/links/a.lnk", "ref")]);
    let catalog = Rc::new(MemoryCatalog::new());
    let engine = engine(&s, &catalog);
    let reference = FileHandle::new(Rc::clone(&s), "/links/a.lnk", FileKind::Reference);

    let err = engine.move_file_to(&reference, &s.root_folder()).unwrap_err();
    assert!(matches!(err, RelocationError::UnsupportedResourceType { kind: "file reference", .. }), "got {err:?}");
    assert!(file_exists(&s, "/links/a.lnk"));
    assert!(!file_exists(&s, "/a.lnk"));
}

#[test]
fn hooks_see_the_original_parent_after_the_move() {
    let s = memory_storage(1, &[("/src/a.txt", "a")]);
    let catalog = Rc::new(MemoryCatalog::new());
    let recorder = Rc::new(Recorder::default());
    let engine = engine(&s, &catalog).with_hooks(recorder.clone());
    let file = catalog.resolve(&s, "/src/a.txt").unwrap();

    engine.move_file_to(&file, &s.root_folder()).unwrap();

    let events = recorder.events.borrow();
    assert_eq!(
        *events,
        vec![
            (Operation::FileMove, "before", None),
            (Operation::FileMove, "after", Some("/src/".to_string())),
        ]
    );
}
