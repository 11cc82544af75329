//! Tests for IndexSet
//!
//! These tests verify:
//! - Insert semantics (one primary entry per id)
//! - The offset-shift law across all three indexes
//! - Relocating offset 0 changes nothing
//! - Secondary lists keep their order across relocations

use mtfstore::index::IndexSet;
use mtfstore::record::{Record, Status};

// =============================================================================
// Helper Functions
// =============================================================================

fn record(id: u64, status: Status, tags: &[&str]) -> Record {
    Record::new(
        Record::format_id(id),
        status,
        "ts",
        1.0,
        tags.iter().map(|t| t.to_string()).collect(),
    )
}

/// Four records at offsets 0, 10, 25, 40
fn populated() -> IndexSet {
    let mut indexes = IndexSet::new();
    indexes.insert(&record(1, Status::Active, &["a"]), 0);
    indexes.insert(&record(2, Status::Pending, &["a", "b"]), 10);
    indexes.insert(&record(3, Status::Active, &["b"]), 25);
    indexes.insert(&record(4, Status::Active, &["a"]), 40);
    indexes
}

// =============================================================================
// Insert Tests
// =============================================================================

#[test]
fn test_insert_registers_all_indexes() {
    let indexes = populated();

    assert_eq!(indexes.len(), 4);
    assert_eq!(indexes.offset_of("000000002"), Some(10));
    assert_eq!(indexes.tag_offsets("a"), &[0, 10, 40]);
    assert_eq!(indexes.tag_offsets("b"), &[10, 25]);
    assert_eq!(indexes.status_offsets(Status::Active), &[0, 25, 40]);
    assert_eq!(indexes.status_offsets(Status::Pending), &[10]);
}

#[test]
fn test_insert_duplicate_id_is_rejected() {
    let mut indexes = populated();

    let inserted = indexes.insert(&record(1, Status::Failed, &["z"]), 99);

    assert!(!inserted);
    assert_eq!(indexes.offset_of("000000001"), Some(0));
    assert!(indexes.tag_offsets("z").is_empty());
    assert!(indexes.status_offsets(Status::Failed).is_empty());
}

#[test]
fn test_empty_index_set() {
    let indexes = IndexSet::new();

    assert!(indexes.is_empty());
    assert_eq!(indexes.offset_of("000000001"), None);
    assert!(!indexes.contains_id("000000001"));
}

// =============================================================================
// Offset-Shift Law Tests
// =============================================================================

#[test]
fn test_relocation_shift_law() {
    let mut indexes = populated();

    // Line at 25 is 15 bytes long
    indexes.apply_relocation(25, 15);

    // v < p → v + L
    assert_eq!(indexes.offset_of("000000001"), Some(15));
    assert_eq!(indexes.offset_of("000000002"), Some(25));
    // v == p → 0
    assert_eq!(indexes.offset_of("000000003"), Some(0));
    // v > p → unchanged
    assert_eq!(indexes.offset_of("000000004"), Some(40));
}

#[test]
fn test_relocation_applies_to_secondary_indexes() {
    let mut indexes = populated();

    indexes.apply_relocation(25, 15);

    assert_eq!(indexes.tag_offsets("a"), &[15, 25, 40]);
    assert_eq!(indexes.tag_offsets("b"), &[25, 0]);
    assert_eq!(indexes.status_offsets(Status::Active), &[15, 0, 40]);
    assert_eq!(indexes.status_offsets(Status::Pending), &[25]);
}

#[test]
fn test_relocation_of_front_is_noop() {
    let mut indexes = populated();
    let before: Vec<(String, u64)> = sorted_primary(&indexes);

    indexes.apply_relocation(0, 10);

    assert_eq!(sorted_primary(&indexes), before);
    assert_eq!(indexes.tag_offsets("a"), &[0, 10, 40]);
}

#[test]
fn test_relocation_of_last_record() {
    let mut indexes = populated();

    indexes.apply_relocation(40, 12);

    assert_eq!(indexes.offset_of("000000004"), Some(0));
    assert_eq!(indexes.offset_of("000000001"), Some(12));
    assert_eq!(indexes.offset_of("000000002"), Some(22));
    assert_eq!(indexes.offset_of("000000003"), Some(37));
}

#[test]
fn test_entry_iterators_cover_every_pair() {
    let indexes = populated();

    assert_eq!(indexes.primary_entries().count(), 4);
    assert_eq!(indexes.tag_entries().count(), 5);
    assert_eq!(indexes.status_entries().count(), 4);
}

fn sorted_primary(indexes: &IndexSet) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = indexes
        .primary_entries()
        .map(|(id, off)| (id.to_string(), off))
        .collect();
    entries.sort();
    entries
}
