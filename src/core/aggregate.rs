//! Appends per-record results onto the cumulative output file.
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::types::SDF_SEPARATOR;

/// Permission bits of the finished output file.
pub const OUTPUT_MODE: u32 = 0o664;

/// Number of non-overlapping record separators in `bytes`.
pub fn count_separators(bytes: &[u8]) -> usize {
    let marker = SDF_SEPARATOR.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i + marker.len() <= bytes.len() {
        if &bytes[i..i + marker.len()] == marker {
            count += 1;
            i += marker.len();
        } else {
            i += 1;
        }
    }
    count
}

#[derive(Debug)]
pub struct Aggregator {
    output: PathBuf,
    total_records: usize,
    appended: usize,
}

impl Aggregator {
    pub fn new(output: &Path) -> Self {
        Self {
            output: output.to_path_buf(),
            total_records: 0,
            appended: 0,
        }
    }

    /// Append the full content of `result` and return how many records it held.
    ///
    /// The output is opened and closed on every call so completed records stay on
    /// disk if the run is interrupted. On error nothing is appended: the result is
    /// read in full before the output is touched, and a failed write is truncated
    /// back to the previous length.
    pub fn append(&mut self, result: &Path) -> Result<usize> {
        let bytes = fs::read(result)?;
        let count = count_separators(&bytes);

        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output)?;
        let start = out.metadata()?.len();
        if let Err(e) = out.write_all(&bytes).and_then(|()| out.flush()) {
            if let Err(truncate) = out.set_len(start) {
                warn!(
                    "Could not roll back partial append to {:?}: {}",
                    self.output, truncate
                );
            }
            return Err(e.into());
        }

        self.total_records += count;
        self.appended += 1;
        debug!(
            "Appended {:?} ({} bytes, {} records) to {:?}",
            result,
            bytes.len(),
            count,
            self.output
        );
        Ok(count)
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Make sure the output exists, fix its permission bits and return the total
    /// record count.
    pub fn finalize(self) -> Result<usize> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.output, fs::Permissions::from_mode(OUTPUT_MODE))?;
        }

        Ok(self.total_records)
    }
}
