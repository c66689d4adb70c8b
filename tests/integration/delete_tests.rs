//! Strategy selection followed by deletion on a real directory tree.

use dupecleaner::actions::{delete_selection, DeleteConfig, DeleteError, ProtectedPaths};
use dupecleaner::duplicates::{DuplicateGroup, FileEntry};
use dupecleaner::selection::{KeepStrategy, ReviewState};
use tempfile::TempDir;

use super::common::write_file;

fn scanned(paths: &[&std::path::Path]) -> DuplicateGroup {
    let files: Vec<FileEntry> = paths
        .iter()
        .map(|p| FileEntry::from_path(p.to_path_buf(), 0))
        .collect();
    let size = files[0].size;
    DuplicateGroup::new("c0ffee".to_string(), size, files)
}

#[test]
fn test_newest_strategy_deletes_older_copies() {
    let dir = TempDir::new().unwrap();
    let oldest = write_file(dir.path(), "2019/photo.jpg", b"pixels", 3000);
    let middle = write_file(dir.path(), "2020/photo.jpg", b"pixels", 2000);
    let newest = write_file(dir.path(), "2021/photo.jpg", b"pixels", 1000);

    let mut review = ReviewState::new(
        vec![scanned(&[&oldest, &middle, &newest])],
        Some(KeepStrategy::Newest),
    );
    assert_eq!(review.stats().selected_count, 2);

    let result = delete_selection(&review, &DeleteConfig::permanent(), &ProtectedPaths::default());
    assert!(result.all_succeeded(), "{}", result.summary());
    assert_eq!(result.bytes_freed, 12);
    assert!(!oldest.exists());
    assert!(!middle.exists());
    assert!(newest.exists());

    review.remove_deleted(&result.removed_paths());
    assert!(review.groups().is_empty());
    assert!(!review.has_selections());
}

#[test]
fn test_manual_override_then_delete() {
    let dir = TempDir::new().unwrap();
    let a = write_file(dir.path(), "a/report.pdf", b"pdf", 50);
    let b = write_file(dir.path(), "b/report.pdf", b"pdf", 40);
    let c = write_file(dir.path(), "c/report.pdf", b"pdf", 30);

    let mut review = ReviewState::new(vec![scanned(&[&a, &b, &c])], Some(KeepStrategy::Oldest));
    review.set_manual_selection([c.clone()]);

    let result = delete_selection(&review, &DeleteConfig::permanent(), &ProtectedPaths::default());
    assert_eq!(result.success_count(), 1);
    assert!(a.exists() && b.exists() && !c.exists());

    review.remove_deleted(&result.removed_paths());
    assert_eq!(review.groups().len(), 1);
    assert_eq!(review.groups()[0].len(), 2);
}

#[test]
fn test_rerun_after_external_removal_is_harmless() {
    let dir = TempDir::new().unwrap();
    let keep = write_file(dir.path(), "keep.txt", b"dup", 20);
    let gone = write_file(dir.path(), "deep/er/gone.txt", b"dup", 10);

    let mut review = ReviewState::new(
        vec![scanned(&[&keep, &gone])],
        Some(KeepStrategy::ShortestPath),
    );
    std::fs::remove_file(&gone).unwrap();

    let result = delete_selection(&review, &DeleteConfig::permanent(), &ProtectedPaths::default());
    assert_eq!(result.success_count(), 0);
    assert!(matches!(result.failures[0], DeleteError::NotFound(_)));

    review.remove_deleted(&result.removed_paths());
    assert!(review.groups().is_empty());
    assert!(keep.exists());
}

#[test]
fn test_file_changed_after_scan_is_skipped() {
    let dir = TempDir::new().unwrap();
    let keep = write_file(dir.path(), "keep.txt", b"dup", 20);
    let changed = write_file(dir.path(), "longer/changed.txt", b"dup", 10);

    let review = ReviewState::new(
        vec![scanned(&[&keep, &changed])],
        Some(KeepStrategy::ShortestPath),
    );
    write_file(dir.path(), "longer/changed.txt", b"edited later", 0);

    let result = delete_selection(&review, &DeleteConfig::permanent(), &ProtectedPaths::default());
    assert!(matches!(result.failures[0], DeleteError::Modified(_)));
    assert!(changed.exists());
}

#[test]
fn test_protected_root_is_never_touched() {
    let dir = TempDir::new().unwrap();
    let keep = write_file(dir.path(), "work/keep.txt", b"dup", 20);
    let guarded = write_file(dir.path(), "vault/copy.txt", b"dup", 10);

    let mut review = ReviewState::new(vec![scanned(&[&keep, &guarded])], None);
    review.set_manual_selection([guarded.clone()]);
    let protected = ProtectedPaths::new([dir.path().join("vault")]);

    let result = delete_selection(&review, &DeleteConfig::permanent(), &protected);
    assert!(matches!(result.failures[0], DeleteError::Protected { .. }));
    assert!(guarded.exists());
    assert!(result.removed_paths().is_empty());
}
