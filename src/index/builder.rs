//! Index Builder
//!
//! Full sequential scan of the storage file into an [`IndexSet`].

use std::io::BufRead;

use crate::error::Result;
use crate::record::{self, LINE_TERMINATOR};

use super::{BuildStats, IndexSet};

/// Builds indexes by scanning lines from offset 0
pub struct IndexBuilder;

impl IndexBuilder {
    /// Scan every line and index the well-formed ones
    ///
    /// Offsets are byte offsets (not character counts). Lines that fail
    /// to decode, and repeated ids after their first occurrence, are
    /// skipped but counted; their bytes are never touched.
    pub fn build<R: BufRead>(mut reader: R) -> Result<(IndexSet, BuildStats)> {
        let mut indexes = IndexSet::new();
        let mut stats = BuildStats::default();
        let mut line = Vec::new();
        let mut offset: u64 = 0;

        loop {
            line.clear();
            let read = reader.read_until(LINE_TERMINATOR, &mut line)?;
            if read == 0 {
                break;
            }

            match record::decode(&line) {
                Ok(rec) => {
                    if indexes.insert(&rec, offset) {
                        stats.records_indexed += 1;
                    } else {
                        stats.duplicate_ids += 1;
                        tracing::warn!(offset, id = %rec.id, "duplicate id left unindexed");
                    }
                }
                Err(reason) => {
                    stats.malformed_lines += 1;
                    tracing::warn!(offset, %reason, "malformed line left unindexed");
                }
            }

            offset += read as u64;
        }

        stats.bytes_scanned = offset;
        Ok((indexes, stats))
    }
}
