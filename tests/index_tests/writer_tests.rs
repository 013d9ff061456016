//! Tests for IndexWriter
//!
//! These tests verify:
//! - Summary metadata of finished index files
//! - Ordering enforcement while adding entries
//! - Invariant checks before anything reaches disk

use asdmstman::index::{DataType, IndexEntry, IndexStore, IndexWriter};
use asdmstman::StManError;
use tempfile::TempDir;

// =============================================================================
// Summary Tests
// =============================================================================

#[test]
fn test_finish_reports_summary() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.asdmindex");

    let mut writer = IndexWriter::create(&path);
    let a = writer.add_file("a.bdf");
    let b = writer.add_file("b.bdf");
    assert_eq!((a, b), (0, 1));

    writer
        .add_entry(IndexEntry::packed(0, DataType::Float32, 4, 8, 2).at(a, 0))
        .unwrap();
    writer
        .add_entry(IndexEntry::packed(4, DataType::AutoFloat32, 2, 8, 3).at(b, 0))
        .unwrap();
    let summary = writer.finish().unwrap();

    assert_eq!(summary.path, path);
    assert_eq!(summary.entry_count, 2);
    assert_eq!(summary.file_count, 2);
    assert_eq!(summary.total_rows, 6);
    assert_eq!(summary.file_size, std::fs::metadata(&path).unwrap().len());
}

#[test]
fn test_written_entries_survive_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.asdmindex");

    let mut entry = IndexEntry::packed(10, DataType::Int32, 3, 16, 4)
        .at(0, 4096)
        .with_scale_factors(vec![512.0, 256.0]);
    entry.n_spw = 2;
    entry.step_spw = 128;
    entry.step_bl = 256;
    entry.block_offset = 32;

    let mut writer = IndexWriter::create(&path);
    writer.add_file("a.bdf");
    writer.add_entry(entry.clone()).unwrap();
    writer.finish().unwrap();

    let store = IndexStore::load(&path, true).unwrap();

    assert_eq!(store.entries(), [entry]);
    assert_eq!(store.total_rows(), 16);
}

// =============================================================================
// Rejection Tests
// =============================================================================

#[test]
fn test_add_entry_out_of_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut writer = IndexWriter::create(&temp_dir.path().join("table.asdmindex"));
    writer.add_file("a.bdf");

    writer
        .add_entry(IndexEntry::packed(5, DataType::Float32, 1, 1, 1))
        .unwrap();
    let result = writer.add_entry(IndexEntry::packed(5, DataType::Float32, 1, 1, 1));

    assert!(matches!(result, Err(StManError::CorruptIndex { .. })));
}

#[test]
fn test_finish_rejects_invalid_entry() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.asdmindex");

    // No file registered for file index 0
    let mut writer = IndexWriter::create(&path);
    writer
        .add_entry(IndexEntry::packed(0, DataType::Float32, 1, 1, 1))
        .unwrap();
    let result = writer.finish();

    assert!(matches!(result, Err(StManError::CorruptIndex { .. })));
    assert!(!path.exists());
}

#[test]
fn test_finish_rejects_row_overflow() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.asdmindex");

    let mut writer = IndexWriter::create(&path);
    writer.add_file("a.bdf");
    writer
        .add_entry(IndexEntry::packed(u64::MAX - 1, DataType::Float32, 4, 1, 1))
        .unwrap();
    let result = writer.finish();

    assert!(matches!(result, Err(StManError::CorruptIndex { .. })));
    assert!(!path.exists());
}

#[test]
fn test_finish_replaces_existing_index() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.asdmindex");
    std::fs::write(&path, b"stale").unwrap();

    let mut writer = IndexWriter::create(&path);
    writer.add_file("a.bdf");
    writer
        .add_entry(IndexEntry::packed(0, DataType::Float32, 2, 1, 1))
        .unwrap();
    writer.finish().unwrap();

    assert_eq!(IndexStore::load(&path, true).unwrap().total_rows(), 2);
    assert!(!temp_dir.path().join("table.asdmindex.tmp").exists());
}
