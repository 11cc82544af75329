//! # mtfstore
//!
//! A flat-file record store that self-organizes by move-to-front:
//! - One record per line, no header, no padding
//! - In-memory primary (id) and secondary (tag, status) offset indexes
//! - Every successful lookup physically moves the matched record to offset 0
//! - Atomic scratch-file swaps so a failed rewrite never leaves mixed state
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                              │
//! │          (one exclusive guard over file + indexes)          │
//! └──────────┬──────────────────┬──────────────────┬────────────┘
//!            │                  │                  │
//!            ▼                  ▼                  ▼
//!   ┌─────────────────┐ ┌───────────────┐ ┌─────────────────┐
//!   │  Query Engine   │ │ Append Engine │ │  Index Builder  │
//!   │ id / tag / stat │ │  (tail write) │ │ (scan on open)  │
//!   └────────┬────────┘ └───────┬───────┘ └────────┬────────┘
//!            │                  │                  │
//!            ▼                  │                  │
//!   ┌─────────────────┐         │                  │
//!   │  Reorganizer    │         │                  │
//!   │ (move-to-front) │         │                  │
//!   └────────┬────────┘         │                  │
//!            ▼                  ▼                  ▼
//!   ┌─────────────────────────────────────────────────────────┐
//!   │          StorageFile  +  IndexSet  +  Record codec      │
//!   └─────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod index;
pub mod storage;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{Config, SyncStrategy};
pub use engine::{Engine, EngineStats, VerifyReport};
pub use record::{Record, Status};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mtfstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
