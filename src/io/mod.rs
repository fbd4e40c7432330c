//! I/O layer: the format-aware molecule record reader/writer used by the
//! structured splitter, and the subprocess adapter for the external engine.
pub mod records;
pub use records::{Record, RecordError, RecordReader, RecordWriter};

pub mod engine;
pub use engine::CommandEngine;
