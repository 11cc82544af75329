//! Engine Module
//!
//! The record store that coordinates the file, the indexes and the
//! move-to-front reorganizer.
//!
//! ## Responsibilities
//! - Build indexes by a full scan on open
//! - Answer id / tag / status lookups, relocating every match to the front
//! - Append records at the tail
//! - Keep file and indexes consistent on every exit path

use std::collections::HashSet;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::index::{BuildStats, IndexBuilder, IndexSet};
use crate::record::{self, Record, Status, LINE_TERMINATOR};
use crate::storage::{self, Reorganization, StorageFile};

/// The record store
///
/// ## Concurrency Model: One Exclusive Guard
///
/// Every public operation, reads included, locks `state` for its whole
/// duration. Lookups relocate what they find, so there is no read-only
/// path; file bytes and all three indexes change together under the lock.
///
/// ## Failure Model
///
/// Relocations are computed on a scratch copy of the file and indexes and
/// committed by one atomic file swap. If the swap fails, the live file and
/// the live indexes are both left as they were before the call.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// File + indexes + counters, guarded as a unit
    state: Mutex<EngineState>,
}

/// Everything the guard covers
struct EngineState {
    file: StorageFile,
    indexes: IndexSet,
    build: BuildStats,
    relocations: u64,
    appends: u64,
}

/// Snapshot of engine counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// Current storage file length in bytes
    pub file_len: u64,
    /// Records reachable through the primary index
    pub indexed_records: u64,
    /// Malformed lines found by the last build
    pub malformed_lines: u64,
    /// Relocations that moved bytes since open
    pub relocations: u64,
    /// Records appended since open
    pub appends: u64,
    /// Result of the last full scan
    pub build: BuildStats,
}

/// Result of a successful [`Engine::verify`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub primary_entries: u64,
    pub tag_entries: u64,
    pub status_entries: u64,
}

impl Engine {
    /// Open the store and build its indexes
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Open the storage file (or create it, if configured)
    /// 3. Scan it once and build all three indexes
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let mut file = StorageFile::open(&config)?;
        let (indexes, build) = IndexBuilder::build(file.reader()?)?;

        tracing::info!(
            path = %config.data_path.display(),
            records = build.records_indexed,
            malformed = build.malformed_lines,
            duplicates = build.duplicate_ids,
            bytes = build.bytes_scanned,
            "store opened"
        );

        Ok(Self {
            config,
            state: Mutex::new(EngineState {
                file,
                indexes,
                build,
                relocations: 0,
                appends: 0,
            }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified storage file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_path(path).build();
        Self::open(config)
    }

    // =========================================================================
    // Query Engine
    // =========================================================================

    /// Look up a record by id
    ///
    /// On a hit the record is moved to the front of the file. A miss
    /// returns `None` and changes nothing.
    pub fn search_by_id(&self, id: &str) -> Result<Option<Record>> {
        let mut state = self.state.lock();

        let Some(offset) = state.indexes.offset_of(id) else {
            tracing::debug!(id, "id lookup miss");
            return Ok(None);
        };

        // Already at the front: no rewrite needed
        if offset == 0 {
            let line = state.file.read_line_at(0)?;
            let record = decode_at(&line, 0)?;
            check_id(&record, id, 0)?;
            return Ok(Some(record));
        }

        let bytes = state.file.read_all()?;
        let mut reorg = Reorganization::new(bytes, state.indexes.clone());
        let record = decode_at(reorg.line_at(offset)?, offset)?;
        check_id(&record, id, offset)?;
        reorg.relocate_to_front(offset)?;

        state.commit(reorg)?;
        tracing::debug!(id, from = offset, "id lookup hit");
        Ok(Some(record))
    }

    /// Look up up to `limit` records carrying `tag`
    ///
    /// Matches are visited in the tag index's append order; each one is
    /// moved to the front before the next is resolved.
    pub fn search_by_tag(&self, tag: &str, limit: usize) -> Result<Vec<Record>> {
        let mut state = self.state.lock();
        let found = state.search_secondary(
            limit,
            |indexes, i| indexes.tag_offsets(tag).get(i).copied(),
            |record| record.tags.iter().any(|t| t == tag),
        )?;
        tracing::debug!(tag, limit, hits = found.len(), "tag lookup");
        Ok(found)
    }

    /// Look up up to `limit` records with `status`
    ///
    /// Same ordering and relocation behavior as [`Engine::search_by_tag`].
    pub fn search_by_status(&self, status: Status, limit: usize) -> Result<Vec<Record>> {
        let mut state = self.state.lock();
        let found = state.search_secondary(
            limit,
            |indexes, i| indexes.status_offsets(status).get(i).copied(),
            |record| record.status == status,
        )?;
        tracing::debug!(%status, limit, hits = found.len(), "status lookup");
        Ok(found)
    }

    /// Move the indexed record starting at `offset` to the front
    ///
    /// Fails with `NotIndexed` if no indexed record starts there.
    pub fn relocate_to_front(&self, offset: u64) -> Result<()> {
        let mut state = self.state.lock();

        let bytes = state.file.read_all()?;
        let mut reorg = Reorganization::new(bytes, state.indexes.clone());
        let record = decode_at(reorg.line_at(offset)?, offset)?;
        if reorg.indexes().offset_of(&record.id) != Some(offset) {
            return Err(StoreError::NotIndexed(offset));
        }
        reorg.relocate_to_front(offset)?;

        state.commit(reorg)
    }

    // =========================================================================
    // Append Engine
    // =========================================================================

    /// Append a record at the end of the file
    ///
    /// Returns the offset the record was written at. Existing bytes are
    /// never rewritten.
    pub fn append(&self, record: &Record) -> Result<u64> {
        record.validate()?;

        let mut state = self.state.lock();

        if state.indexes.contains_id(&record.id) {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }

        let encoded = record::encode(record);
        let offset = state.file.append(&encoded)?;

        state.indexes.insert(record, offset);
        state.appends += 1;

        tracing::debug!(id = %record.id, offset, len = encoded.len(), "record appended");
        Ok(offset)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Check every index value against the bytes on disk
    ///
    /// Each primary offset must decode to its id, each tag offset to a
    /// record carrying that tag, each status offset to that status.
    pub fn verify(&self) -> Result<VerifyReport> {
        let mut state = self.state.lock();
        let bytes = state.file.read_all()?;
        let mut report = VerifyReport::default();

        if bytes.len() as u64 != state.file.len() {
            return Err(StoreError::Corruption(format!(
                "file is {} bytes, expected {}",
                bytes.len(),
                state.file.len()
            )));
        }

        for (id, offset) in state.indexes.primary_entries() {
            let record = indexed_record(&bytes, offset)?;
            check_id(&record, id, offset)?;
            report.primary_entries += 1;
        }

        for (tag, offset) in state.indexes.tag_entries() {
            let record = indexed_record(&bytes, offset)?;
            if !record.tags.iter().any(|t| t == tag) {
                return Err(StoreError::Corruption(format!(
                    "tag index points {} at offset {}, record {} has tags {:?}",
                    tag, offset, record.id, record.tags
                )));
            }
            report.tag_entries += 1;
        }

        for (status, offset) in state.indexes.status_entries() {
            let record = indexed_record(&bytes, offset)?;
            if record.status != status {
                return Err(StoreError::Corruption(format!(
                    "status index points {} at offset {}, record {} is {}",
                    status, offset, record.id, record.status
                )));
            }
            report.status_entries += 1;
        }

        Ok(report)
    }

    /// Discard the indexes and rebuild them from a full scan
    ///
    /// Required after anything outside this engine modifies the file.
    pub fn rebuild(&self) -> Result<BuildStats> {
        let mut state = self.state.lock();

        let mut file = StorageFile::open(&self.config)?;
        let (indexes, build) = IndexBuilder::build(file.reader()?)?;

        tracing::info!(
            records = build.records_indexed,
            malformed = build.malformed_lines,
            duplicates = build.duplicate_ids,
            bytes = build.bytes_scanned,
            "indexes rebuilt"
        );

        state.file = file;
        state.indexes = indexes;
        state.build = build;
        Ok(build)
    }

    /// Decode every well-formed line in physical order, without relocating
    pub fn scan(&self) -> Result<Vec<Record>> {
        let mut state = self.state.lock();
        let bytes = state.file.read_all()?;

        Ok(bytes
            .split_inclusive(|&b| b == LINE_TERMINATOR)
            .filter_map(|line| record::decode(line).ok())
            .collect())
    }

    /// Flush and close the store
    pub fn close(self) -> Result<()> {
        let mut state = self.state.into_inner();
        state.file.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Current offset of a record id
    pub fn offset_of(&self, id: &str) -> Option<u64> {
        self.state.lock().indexes.offset_of(id)
    }

    /// Current offsets for a tag, in append order
    pub fn tag_offsets(&self, tag: &str) -> Vec<u64> {
        self.state.lock().indexes.tag_offsets(tag).to_vec()
    }

    /// Current offsets for a status, in append order
    pub fn status_offsets(&self, status: Status) -> Vec<u64> {
        self.state.lock().indexes.status_offsets(status).to_vec()
    }

    /// Snapshot of engine counters
    pub fn stats(&self) -> EngineStats {
        let state = self.state.lock();
        EngineStats {
            file_len: state.file.len(),
            indexed_records: state.indexes.len() as u64,
            malformed_lines: state.build.malformed_lines,
            relocations: state.relocations,
            appends: state.appends,
            build: state.build,
        }
    }

    /// Get the storage file path
    pub fn data_path(&self) -> &Path {
        &self.config.data_path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl EngineState {
    /// Visit secondary-index matches one at a time, relocating each
    ///
    /// `resolve` is asked for the i-th offset against the scratch indexes
    /// immediately before that match is read, so every earlier relocation
    /// in this call is already reflected in the offset it returns.
    fn search_secondary<R, M>(&mut self, limit: usize, resolve: R, matches: M) -> Result<Vec<Record>>
    where
        R: Fn(&IndexSet, usize) -> Option<u64>,
        M: Fn(&Record) -> bool,
    {
        if limit == 0 || resolve(&self.indexes, 0).is_none() {
            return Ok(Vec::new());
        }

        let bytes = self.file.read_all()?;
        let mut reorg = Reorganization::new(bytes, self.indexes.clone());
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        let mut position = 0;

        while found.len() < limit {
            let Some(offset) = resolve(reorg.indexes(), position) else {
                break;
            };
            position += 1;

            let record = decode_at(reorg.line_at(offset)?, offset)?;
            if !matches(&record) {
                return Err(StoreError::Corruption(format!(
                    "secondary index points at record {} (offset {}) which does not match",
                    record.id, offset
                )));
            }

            // A record listing the same tag twice appears twice in the list
            if !seen.insert(record.id.clone()) {
                continue;
            }

            reorg.relocate_to_front(offset)?;
            found.push(record);
        }

        self.commit(reorg)?;
        Ok(found)
    }

    /// Swap in a finished reorganization, or leave everything untouched
    fn commit(&mut self, reorg: Reorganization) -> Result<()> {
        let moves = reorg.moves();
        let (layout, indexes) = reorg.into_parts();

        if moves > 0 {
            self.file.swap(&layout)?;
        }

        self.indexes = indexes;
        self.relocations += moves;
        Ok(())
    }
}

fn decode_at(line: &[u8], offset: u64) -> Result<Record> {
    record::decode(line).map_err(|reason| StoreError::Malformed { offset, reason })
}

/// Read an index target for verification; any failure is corruption
fn indexed_record(bytes: &[u8], offset: u64) -> Result<Record> {
    let line = storage::line_at(bytes, offset).map_err(|_| {
        StoreError::Corruption(format!("index offset {} is not a line start", offset))
    })?;
    record::decode(line).map_err(|reason| {
        StoreError::Corruption(format!("index offset {} holds a malformed line: {}", offset, reason))
    })
}

fn check_id(record: &Record, id: &str, offset: u64) -> Result<()> {
    if record.id != id {
        return Err(StoreError::Corruption(format!(
            "primary index maps {} to offset {}, which holds {}",
            id, offset, record.id
        )));
    }
    Ok(())
}
