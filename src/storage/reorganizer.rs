//! Move-to-Front Reorganizer
//!
//! Computes new file layouts in memory. Nothing here touches disk: a
//! [`Reorganization`] accumulates one or more relocations over a scratch
//! copy of the file and of the indexes, and the engine swaps both in
//! only once every step has succeeded.

use crate::error::{Result, StoreError};
use crate::index::IndexSet;
use crate::record::LINE_TERMINATOR;

/// One planned relocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// The full file after the move
    pub layout: Vec<u8>,
    /// Where the line started before the move
    pub moved_from: u64,
    /// Bytes the line occupies at the front, terminator included
    pub len: u64,
}

/// Slice out the line starting at `offset`, terminator included if present
///
/// `offset` must be a line start: 0 or right after a terminator.
pub fn line_at(bytes: &[u8], offset: u64) -> Result<&[u8]> {
    let start = offset as usize;
    if start >= bytes.len() || (start > 0 && bytes[start - 1] != LINE_TERMINATOR) {
        return Err(StoreError::NotIndexed(offset));
    }

    let end = bytes[start..]
        .iter()
        .position(|&b| b == LINE_TERMINATOR)
        .map(|i| start + i + 1)
        .unwrap_or(bytes.len());

    Ok(&bytes[start..end])
}

/// Plan moving the line at `offset` to the front of `current`
///
/// Returns `None` when the line is already at offset 0. Bytes before
/// the line shift forward by its length; bytes after it stay put. Only
/// terminated lines can move: relocating an unterminated tail would
/// have to borrow a terminator from the line before it.
pub fn plan_relocation(current: &[u8], offset: u64) -> Result<Option<Relocation>> {
    let line = line_at(current, offset)?;
    if offset == 0 {
        return Ok(None);
    }
    if line.last() != Some(&LINE_TERMINATOR) {
        return Err(StoreError::Corruption(format!(
            "line at offset {} has no terminator",
            offset
        )));
    }

    let start = offset as usize;
    let mut layout = Vec::with_capacity(current.len());
    layout.extend_from_slice(line);
    layout.extend_from_slice(&current[..start]);
    layout.extend_from_slice(&current[start + line.len()..]);

    debug_assert_eq!(layout.len(), current.len());

    Ok(Some(Relocation {
        layout,
        moved_from: offset,
        len: line.len() as u64,
    }))
}

/// Scratch state for a sequence of relocations inside one operation
pub struct Reorganization {
    layout: Vec<u8>,
    indexes: IndexSet,
    moves: u64,
}

impl Reorganization {
    /// Start from the current file bytes and a copy of the indexes
    pub fn new(layout: Vec<u8>, indexes: IndexSet) -> Self {
        Self {
            layout,
            indexes,
            moves: 0,
        }
    }

    /// Indexes reflecting every relocation applied so far
    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    /// Layout reflecting every relocation applied so far
    pub fn layout(&self) -> &[u8] {
        &self.layout
    }

    /// Relocations that actually moved bytes
    pub fn moves(&self) -> u64 {
        self.moves
    }

    /// The line at `offset` in the current scratch layout
    pub fn line_at(&self, offset: u64) -> Result<&[u8]> {
        line_at(&self.layout, offset)
    }

    /// Move the line at `offset` to the front and shift every index
    pub fn relocate_to_front(&mut self, offset: u64) -> Result<()> {
        if let Some(relocation) = plan_relocation(&self.layout, offset)? {
            self.indexes
                .apply_relocation(relocation.moved_from, relocation.len);
            self.layout = relocation.layout;
            self.moves += 1;
            tracing::trace!(from = offset, len = relocation.len, "relocated line to front");
        }
        Ok(())
    }

    /// Final layout and indexes
    pub fn into_parts(self) -> (Vec<u8>, IndexSet) {
        (self.layout, self.indexes)
    }
}
