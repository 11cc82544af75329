//! Index Module
//!
//! In-memory offset indexes over the storage file.
//!
//! ## Responsibilities
//! - Primary index: record id → line start offset (one per id)
//! - Secondary indexes: tag / status → offsets in append order
//! - Apply the offset-shift law after every relocation
//!
//! ## Offset-Shift Law
//! When the line starting at `p` (length `L`) moves to offset 0, every
//! stored offset `v` in every index becomes:
//! ```text
//!   v == p  →  0
//!   v <  p  →  v + L
//!   v >  p  →  v
//! ```
//! Secondary lists keep their order; only the values change.

pub mod builder;

use std::collections::HashMap;

use crate::record::{Record, Status};

pub use builder::IndexBuilder;

/// Counters gathered while scanning the storage file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Lines decoded and added to every index
    pub records_indexed: u64,

    /// Lines that failed to decode (left on disk, never indexed)
    pub malformed_lines: u64,

    /// Well-formed lines whose id was already indexed earlier in the file
    pub duplicate_ids: u64,

    /// Total bytes read
    pub bytes_scanned: u64,
}

/// The primary, tag and status indexes, always mutated together
#[derive(Debug, Clone, Default)]
pub struct IndexSet {
    /// id → offset
    primary: HashMap<String, u64>,

    /// tag → offsets, one per (record, tag) pair, in append order
    tags: HashMap<String, Vec<u64>>,

    /// status → offsets, one per record, in append order
    statuses: HashMap<Status, Vec<u64>>,
}

impl IndexSet {
    /// Create an empty index set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record whose line starts at `offset`
    ///
    /// Returns false (and changes nothing) if the id is already indexed.
    pub fn insert(&mut self, record: &Record, offset: u64) -> bool {
        if self.primary.contains_key(&record.id) {
            return false;
        }

        self.primary.insert(record.id.clone(), offset);
        for tag in &record.tags {
            self.tags.entry(tag.clone()).or_default().push(offset);
        }
        self.statuses.entry(record.status).or_default().push(offset);

        true
    }

    /// Rewrite every stored offset for a relocation of the line at
    /// `moved_from` with length `len` to the front of the file
    pub fn apply_relocation(&mut self, moved_from: u64, len: u64) {
        if moved_from == 0 {
            return;
        }

        for offset in self.primary.values_mut() {
            *offset = shift(*offset, moved_from, len);
        }
        for offsets in self.tags.values_mut().chain(self.statuses.values_mut()) {
            for offset in offsets.iter_mut() {
                *offset = shift(*offset, moved_from, len);
            }
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Current offset of a record id
    pub fn offset_of(&self, id: &str) -> Option<u64> {
        self.primary.get(id).copied()
    }

    /// Whether an id is indexed
    pub fn contains_id(&self, id: &str) -> bool {
        self.primary.contains_key(id)
    }

    /// All offsets for a tag, in append order
    pub fn tag_offsets(&self, tag: &str) -> &[u64] {
        self.tags.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All offsets for a status, in append order
    pub fn status_offsets(&self, status: Status) -> &[u64] {
        self.statuses
            .get(&status)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    /// Whether no record is indexed
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    // =========================================================================
    // Iteration (verification and tests)
    // =========================================================================

    /// (id, offset) pairs of the primary index, unordered
    pub fn primary_entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.primary.iter().map(|(id, &off)| (id.as_str(), off))
    }

    /// (tag, offset) pairs of the tag index
    pub fn tag_entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.tags
            .iter()
            .flat_map(|(tag, offs)| offs.iter().map(move |&off| (tag.as_str(), off)))
    }

    /// (status, offset) pairs of the status index
    pub fn status_entries(&self) -> impl Iterator<Item = (Status, u64)> + '_ {
        self.statuses
            .iter()
            .flat_map(|(&status, offs)| offs.iter().map(move |&off| (status, off)))
    }
}

fn shift(offset: u64, moved_from: u64, len: u64) -> u64 {
    if offset == moved_from {
        0
    } else if offset < moved_from {
        offset + len
    } else {
        offset
    }
}
