//! Storage Module
//!
//! The flat record file and the move-to-front reorganizer.
//!
//! ## Responsibilities
//! - Byte-level access to the storage file (line reads, tail appends)
//! - Atomic layout swaps through a scratch file + rename
//! - Planning relocations of a line to offset 0 in a scratch buffer
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ record line\n   ← offset 0             │
//! ├────────────────────────────────────────┤
//! │ record line\n                          │
//! ├────────────────────────────────────────┤
//! │ ... no header, no gaps, no padding ... │
//! └────────────────────────────────────────┘
//! ```
//!
//! ## Relocation
//! ```text
//!   before:  [ A ][ B ][ C ][ D ]        relocate C (offset p, length L)
//!   after:   [ C ][ A ][ B ][ D ]        A, B shift by +L; D does not move
//! ```

pub mod file;
pub mod reorganizer;

pub use file::StorageFile;
pub use reorganizer::{line_at, plan_relocation, Relocation, Reorganization};
