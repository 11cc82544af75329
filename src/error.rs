//! Error types for mtfstore
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::record::Malformed;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for mtfstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Malformed record at offset {offset}: {reason}")]
    Malformed { offset: u64, reason: Malformed },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("No indexed record starts at offset {0}")]
    NotIndexed(u64),

    #[error("Index corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
