//! Configuration for mtfstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Main configuration for an mtfstore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// The record file itself. Relocations write a sibling scratch file
    /// `{data_path}.swap` and rename it over this path.
    pub data_path: PathBuf,

    /// Create an empty storage file when `data_path` does not exist
    pub create_if_missing: bool,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// When to fsync appends and swapped layouts
    pub sync_strategy: SyncStrategy,

    /// Read the scratch file back and compare CRC32 before swapping it in
    pub verify_swaps: bool,

    // -------------------------------------------------------------------------
    // Query Configuration
    // -------------------------------------------------------------------------
    /// Limit used by front ends for tag/status searches when none is given
    pub default_search_limit: usize,
}

/// Sync strategy for writes to the storage file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append and every swap (safest, slowest)
    EveryWrite,

    /// Leave flushing to the OS; swaps are still atomic renames
    OsBuffered,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./records.txt"),
            create_if_missing: false,
            sync_strategy: SyncStrategy::EveryWrite,
            verify_swaps: true,
            default_search_limit: 10,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the scratch file used for atomic layout swaps
    pub fn swap_path(&self) -> PathBuf {
        let mut name = self.data_path.as_os_str().to_os_string();
        name.push(".swap");
        PathBuf::from(name)
    }

    /// Reject configurations the engine cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.data_path.as_os_str().is_empty() {
            return Err(StoreError::Config("data_path must not be empty".to_string()));
        }
        if self.data_path.is_dir() {
            return Err(StoreError::Config(format!(
                "data_path {} is a directory",
                self.data_path.display()
            )));
        }
        if self.default_search_limit == 0 {
            return Err(StoreError::Config(
                "default_search_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage file path
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_path = path.into();
        self
    }

    /// Create the storage file if it does not exist
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Enable or disable CRC read-back of scratch files
    pub fn verify_swaps(mut self, verify: bool) -> Self {
        self.config.verify_swaps = verify;
        self
    }

    /// Set the default tag/status search limit
    pub fn default_search_limit(mut self, limit: usize) -> Self {
        self.config.default_search_limit = limit;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
