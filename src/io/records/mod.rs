//! Format-aware molecule record reader and writer used by the structured splitter.
//!
//! A [`Record`] is one molecule entry: its structure (a SMILES string or an SDF
//! molblock), an optional identity, and its named properties in source order.
//!
//! Delimited SMILES columns go through the `csv` crate, so quoted fields may
//! contain the delimiter. With the space delimiter, columns are split on runs
//! of whitespace instead, as in the usual `.smi` layout.
use thiserror::Error;

use crate::types::InputFormat;

pub mod reader;
pub mod writer;

pub use reader::RecordReader;
pub use writer::RecordWriter;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("malformed {format} record: {details} (at line ~{line})")]
    Shape {
        format: InputFormat,
        line: usize,
        details: String,
    },

    #[error("id column {0:?} does not name a column")]
    UnknownIdColumn(String),

    #[error("delimiter {0:?} is not a single-byte character")]
    Delimiter(char),
}

impl RecordError {
    pub fn shape(format: InputFormat, line: usize, details: impl Into<String>) -> Self {
        Self::Shape {
            format,
            line,
            details: details.into(),
        }
    }

    /// Shape errors affect a single record; reading can continue past them.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RecordError::Shape { .. })
    }
}

/// Byte form of a column delimiter for the `csv` reader and writer.
pub(crate) fn delimiter_byte(delimiter: char) -> Result<u8, RecordError> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(RecordError::Delimiter(delimiter))
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub structure: String,
    pub identity: Option<String>,
    pub properties: Vec<(String, String)>,
}

impl Record {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
