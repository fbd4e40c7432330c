//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, record and serialization errors, and provides semantic
//! variants for configuration problems and fatal engine failures.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record error: {0}")]
    Record(#[from] crate::io::RecordError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown file type: {ext:?} (expected .smi, .smiles, .sdf or .sd)")]
    UnsupportedExtension { ext: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Engine failed on record {index} ({path:?}): {detail}")]
    Engine {
        index: usize,
        path: PathBuf,
        detail: String,
    },
}
