//! Storage File
//!
//! Owns the open handle to the record file. Every mutation either
//! completes or leaves the file exactly as it was.
//!
//! Once open, a non-empty file always ends with a line terminator, so
//! every line (the last one included) can be moved as a whole.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Take, Write};
use std::path::{Path, PathBuf};

use crate::config::{Config, SyncStrategy};
use crate::error::{Result, StoreError};
use crate::record::LINE_TERMINATOR;

/// Handle to the storage file
pub struct StorageFile {
    /// Path of the live file
    path: PathBuf,
    /// Scratch file written before each swap
    swap_path: PathBuf,
    /// Read/write handle to the live file
    file: File,
    /// Current length in bytes (tracked, not re-queried)
    len: u64,
    sync_strategy: SyncStrategy,
    verify_swaps: bool,
}

impl StorageFile {
    /// Open the storage file described by `config`
    ///
    /// Fails with `FileNotFound` unless the file exists or
    /// `create_if_missing` is set. A file whose last line lacks its
    /// terminator gets one appended before anything else reads it.
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.data_path.clone();

        if !path.exists() && !config.create_if_missing {
            return Err(StoreError::FileNotFound(path));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create_if_missing)
            .truncate(false)
            .open(&path)?;
        let len = file.metadata()?.len();

        // A scratch file left over from an interrupted swap was never
        // renamed, so the live file is still the last committed layout.
        let swap_path = config.swap_path();
        if swap_path.exists() {
            tracing::warn!(path = %swap_path.display(), "removing stale swap file");
            fs::remove_file(&swap_path)?;
        }

        let mut storage = Self {
            path,
            swap_path,
            file,
            len,
            sync_strategy: config.sync_strategy,
            verify_swaps: config.verify_swaps,
        };
        storage.terminate_last_line()?;
        Ok(storage)
    }

    /// Current file length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the file holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Path of the live file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Buffered reader over the first `len()` bytes
    pub fn reader(&mut self) -> Result<BufReader<Take<&mut File>>> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(BufReader::new(std::io::Read::by_ref(&mut self.file).take(self.len)))
    }

    /// Read the whole file
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.len as usize);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Read the line starting at `offset`, terminator included if present
    pub fn read_line_at(&mut self, offset: u64) -> Result<Vec<u8>> {
        if offset >= self.len {
            return Err(StoreError::NotIndexed(offset));
        }

        self.file.seek(SeekFrom::Start(offset))?;
        let mut line = Vec::new();
        BufReader::new(&mut self.file).read_until(LINE_TERMINATOR, &mut line)?;
        Ok(line)
    }

    /// Whether the last byte is a line terminator (false when empty)
    pub fn ends_with_terminator(&mut self) -> Result<bool> {
        if self.len == 0 {
            return Ok(false);
        }

        let mut last = [0u8; 1];
        self.file.seek(SeekFrom::Start(self.len - 1))?;
        self.file.read_exact(&mut last)?;
        Ok(last[0] == LINE_TERMINATOR)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write `bytes` at the end of the file and return where they start
    ///
    /// On failure the file is truncated back to its previous length.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let start = self.len;

        if let Err(e) = self.write_tail(start, bytes) {
            tracing::error!(error = %e, start, "append failed, truncating tail");
            if let Err(rollback) = self.file.set_len(start) {
                tracing::error!(error = %rollback, "tail truncation failed");
            }
            return Err(e);
        }

        self.len = start + bytes.len() as u64;
        Ok(start)
    }

    /// Replace the whole file with `layout`
    ///
    /// The layout goes to the scratch file first, is synced (and
    /// optionally read back and checksummed), then renamed over the live
    /// file. Until the rename succeeds the live file is untouched.
    pub fn swap(&mut self, layout: &[u8]) -> Result<()> {
        let scratch = match self.write_scratch(layout) {
            Ok(scratch) => scratch,
            Err(e) => {
                tracing::error!(error = %e, "swap aborted before rename");
                let _ = fs::remove_file(&self.swap_path);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&self.swap_path, &self.path) {
            tracing::error!(error = %e, "swap rename failed");
            let _ = fs::remove_file(&self.swap_path);
            return Err(e.into());
        }

        // The scratch handle now refers to the live file
        self.file = scratch;
        self.len = layout.len() as u64;
        Ok(())
    }

    /// Flush everything to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn terminate_last_line(&mut self) -> Result<()> {
        if self.len == 0 || self.ends_with_terminator()? {
            return Ok(());
        }

        tracing::warn!(path = %self.path.display(), len = self.len, "terminating unterminated last line");
        self.append(&[LINE_TERMINATOR])?;
        Ok(())
    }

    fn write_tail(&mut self, start: u64, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(start))?;
        self.file.write_all(bytes)?;
        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.file.sync_data()?;
        }
        Ok(())
    }

    fn write_scratch(&self, layout: &[u8]) -> Result<File> {
        let mut scratch = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.swap_path)?;

        scratch.write_all(layout)?;
        scratch.flush()?;
        if self.sync_strategy == SyncStrategy::EveryWrite {
            scratch.sync_all()?;
        }

        if self.verify_swaps {
            let expected = crc32fast::hash(layout);
            let mut written = Vec::with_capacity(layout.len());
            scratch.seek(SeekFrom::Start(0))?;
            scratch.read_to_end(&mut written)?;
            let actual = crc32fast::hash(&written);
            if actual != expected {
                return Err(StoreError::Corruption(format!(
                    "swap file checksum mismatch: expected {:08x}, got {:08x}",
                    expected, actual
                )));
            }
        }

        Ok(scratch)
    }
}
