mod common;

use relocator::{NameResolver, RelocationError, Storage};
use relocator::MemoryDriver;

use common::memory_storage;

#[test]
fn free_name_comes_back_unchanged() {
    let s = memory_storage(1, &[("/docs/other.txt", "x")]);
    let folder = s.folder("/docs/").unwrap();
    assert_eq!(NameResolver::new().resolve(&folder, "report.txt").unwrap(), "report.txt");
}

#[test]
fn counters_are_tried_in_order() {
    let s = memory_storage(
        1,
        &[("/docs/report.txt", "a"), ("/docs/report_01.txt", "b"), ("/docs/report_03.txt", "c")],
    );
    let folder = s.folder("/docs/").unwrap();
    let names = NameResolver::new();
    assert_eq!(names.resolve(&folder, "report.txt").unwrap(), "report_02.txt");
    // An existing counter is stripped before probing.
    assert_eq!(names.resolve(&folder, "report_03.txt").unwrap(), "report_02.txt");
}

#[test]
fn folders_and_dotfiles_collide_too() {
    let s = memory_storage(1, &[("/docs/album/track.flac", "a"), ("/docs/.env", "b")]);
    let folder = s.folder("/docs/").unwrap();
    let names = NameResolver::new();
    assert_eq!(names.resolve(&folder, "album").unwrap(), "album_01");
    assert_eq!(names.resolve(&folder, ".env").unwrap(), ".env_01");
}

#[test]
fn random_branch_then_exhaustion() {
    let mut driver = MemoryDriver::new().with_file("/d/file.txt", "x");
    for n in 1..=99 {
        driver = driver.with_file(&format!("/d/file_{n:02}.txt"), "x");
    }
    let s = Storage::new(1, "full", driver);
    let folder = s.folder("/d/").unwrap();

    let random = NameResolver::seeded(7).resolve(&folder, "file.txt").unwrap();
    assert!(random.starts_with("file_") && random.ends_with(".txt"), "got {random}");
    let hex = &random["file_".len()..random.len() - ".txt".len()];
    assert_eq!(hex.len(), 6);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()), "got {random}");

    // Occupy the random candidate; the same seed now draws the same name.
    s.driver().copy_file_within_storage("/d/file.txt", "/d/", &random).unwrap();
    match NameResolver::seeded(7).resolve(&folder, "file.txt") {
        Err(RelocationError::NamespaceExhausted { folder, last_candidate }) => {
            assert_eq!(folder, "/d/");
            assert_eq!(last_candidate, random);
        }
        other => panic!("expected NamespaceExhausted, got {other:?}"),
    }
}

#[test]
fn opting_out_skips_the_probe() {
    let s = memory_storage(1, &[("/docs/report.txt", "a")]);
    let folder = s.folder("/docs/").unwrap();
    let names = NameResolver::new().without_uniqueness_check();
    assert_eq!(names.resolve(&folder, "report.txt").unwrap(), "report.txt");
}
