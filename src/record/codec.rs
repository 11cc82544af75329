//! Record codec
//!
//! Encoding and decoding of a single record line.

use thiserror::Error;

use super::{Record, Status};

/// Separator between the five fields of a line
pub const FIELD_SEPARATOR: char = ';';

/// Separator between tags inside the last field
pub const TAG_SEPARATOR: char = ',';

/// Every line ends with exactly one of these
pub const LINE_TERMINATOR: u8 = b'\n';

/// Fields per well-formed line
pub const FIELD_COUNT: usize = 5;

/// Why a line could not be decoded into a [`Record`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Malformed {
    #[error("line is not valid UTF-8")]
    NotUtf8,

    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),

    #[error("unknown status {0:?}")]
    UnknownStatus(String),

    #[error("value {0:?} is not a number")]
    InvalidValue(String),
}

/// Encode a record as one line, including the trailing newline
pub fn encode(record: &Record) -> Vec<u8> {
    let line = format!(
        "{id}{sep}{status}{sep}{timestamp}{sep}{value:.2}{sep}{tags}\n",
        id = record.id,
        status = record.status,
        timestamp = record.timestamp,
        value = record.value,
        tags = record.tags.join(&TAG_SEPARATOR.to_string()),
        sep = FIELD_SEPARATOR,
    );
    line.into_bytes()
}

/// Decode one line into a record
///
/// A single trailing newline is ignored. An empty tag field still
/// produces one empty-string tag.
pub fn decode(line: &[u8]) -> Result<Record, Malformed> {
    let line = line.strip_suffix(&[LINE_TERMINATOR]).unwrap_or(line);
    let text = std::str::from_utf8(line).map_err(|_| Malformed::NotUtf8)?;

    let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
    if fields.len() != FIELD_COUNT {
        return Err(Malformed::FieldCount(fields.len()));
    }

    let status: Status = fields[1].parse()?;
    let value = fields[3]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Malformed::InvalidValue(fields[3].to_string()))?;
    let tags = fields[4]
        .split(TAG_SEPARATOR)
        .map(str::to_string)
        .collect();

    Ok(Record {
        id: fields[0].to_string(),
        status,
        timestamp: fields[2].to_string(),
        value,
        tags,
    })
}
