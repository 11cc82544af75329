//! Record Module
//!
//! The data model stored one-per-line in the storage file.
//!
//! ## Line Format
//! ```text
//! ┌───────────┬────────┬───────────┬───────┬──────────────────┐
//! │ id (9)    │ status │ timestamp │ value │ tag1,tag2,...    │
//! └───────────┴────────┴───────────┴───────┴──────────────────┘
//!   separated by ';', terminated by a single '\n'
//! ```
//!
//! - `id`: 9 zero-padded decimal digits, unique across the file
//! - `status`: ACTIVE | PENDING | COMPLETED | FAILED
//! - `timestamp`: opaque text, never parsed
//! - `value`: float, written with exactly two decimals
//! - `tags`: comma-joined, order preserved

pub mod codec;

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};

pub use codec::{
    decode, encode, Malformed, FIELD_COUNT, FIELD_SEPARATOR, LINE_TERMINATOR, TAG_SEPARATOR,
};

/// Number of digits in a record id
pub const ID_WIDTH: usize = 9;

/// Record lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Active,
    Pending,
    Completed,
    Failed,
}

impl Status {
    /// Every status, in declaration order
    pub const ALL: [Status; 4] = [
        Status::Active,
        Status::Pending,
        Status::Completed,
        Status::Failed,
    ];

    /// The literal written to disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "ACTIVE",
            Status::Pending => "PENDING",
            Status::Completed => "COMPLETED",
            Status::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Malformed;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Status::Active),
            "PENDING" => Ok(Status::Pending),
            "COMPLETED" => Ok(Status::Completed),
            "FAILED" => Ok(Status::Failed),
            other => Err(Malformed::UnknownStatus(other.to_string())),
        }
    }
}

/// A single stored record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub status: Status,
    pub timestamp: String,
    pub value: f64,
    pub tags: Vec<String>,
}

impl Record {
    /// Create a record
    pub fn new(
        id: impl Into<String>,
        status: Status,
        timestamp: impl Into<String>,
        value: f64,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status,
            timestamp: timestamp.into(),
            value,
            tags,
        }
    }

    /// Format a numeric id as the zero-padded on-disk form
    ///
    /// `format_id(42)` → `"000000042"`
    pub fn format_id(id: u64) -> String {
        format!("{:0width$}", id, width = ID_WIDTH)
    }

    /// Check that this record encodes to exactly one unambiguous line
    ///
    /// Rejects ids that are not 9 ASCII digits, NaN or infinite values,
    /// separators or newlines inside timestamp/tags, and an empty tag
    /// list (which would read back as a single empty tag).
    pub fn validate(&self) -> Result<()> {
        if self.id.len() != ID_WIDTH || !self.id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StoreError::InvalidRecord(format!(
                "id {:?} is not {} decimal digits",
                self.id, ID_WIDTH
            )));
        }

        if !self.value.is_finite() {
            return Err(StoreError::InvalidRecord(format!(
                "value {} has no two-decimal form",
                self.value
            )));
        }

        if has_separator(&self.timestamp) {
            return Err(StoreError::InvalidRecord(format!(
                "timestamp {:?} contains a separator",
                self.timestamp
            )));
        }

        if self.tags.is_empty() {
            return Err(StoreError::InvalidRecord(
                "record must carry at least one tag".to_string(),
            ));
        }

        if let Some(tag) = self
            .tags
            .iter()
            .find(|t| has_separator(t) || t.contains(TAG_SEPARATOR))
        {
            return Err(StoreError::InvalidRecord(format!(
                "tag {:?} contains a separator",
                tag
            )));
        }

        Ok(())
    }
}

fn has_separator(field: &str) -> bool {
    field.contains(FIELD_SEPARATOR) || field.bytes().any(|b| b == LINE_TERMINATOR)
}
