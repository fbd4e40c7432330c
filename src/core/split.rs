//! Record splitting: materialize every record of a combined input file as its own
//! file inside the run workspace, in input order.
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::params::RecordIoOptions;
use crate::core::workspace::Workspace;
use crate::error::Result;
use crate::events::EventSink;
use crate::io::{RecordReader, RecordWriter};
use crate::types::InputFormat;

fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Split `input` byte-for-byte on its format separator.
///
/// A line containing the separator anywhere closes the current record. Bytes after
/// the last separator do not form a record and are dropped.
pub fn split_records(input: &Path, workspace: &Workspace) -> Result<Vec<PathBuf>> {
    let format = InputFormat::from_path(input)?;
    let ext = dotted_extension(input);
    let separator = format.separator();

    let mut reader = BufReader::new(File::open(input)?);
    let mut files = Vec::new();
    let mut buffer: Vec<u8> = Vec::new();
    let mut line: Vec<u8> = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        buffer.extend_from_slice(&line);
        if contains(&line, separator) {
            let path = workspace.record_path(files.len() + 1, &ext);
            fs::write(&path, &buffer)?;
            buffer.clear();
            files.push(path);
        }
    }

    if !buffer.is_empty() {
        debug!(
            "Dropped {} trailing bytes of {:?} without a closing separator",
            buffer.len(),
            input
        );
    }
    info!("Split {:?} into {} {} records", input, files.len(), format);
    Ok(files)
}

/// Split `input` by parsing each record and writing it back through a record writer.
///
/// Records the reader cannot shape into structure, identity and properties are
/// reported and skipped; I/O failures abort the split.
pub fn split_structured(
    input: &Path,
    workspace: &Workspace,
    options: &RecordIoOptions,
    events: &dyn EventSink,
) -> Result<Vec<PathBuf>> {
    let format = InputFormat::from_path(input)?;
    let ext = dotted_extension(input);

    let mut reader = RecordReader::open(input, format, options)?;
    let field_names = reader.extra_field_names().to_vec();
    let mut files = Vec::new();
    let mut position = 0;

    loop {
        position += 1;
        match reader.read_record() {
            Ok(Some(record)) => {
                let path = workspace.record_path(files.len() + 1, &ext);
                let mut writer = RecordWriter::create(&path, format, options.delimiter)?;
                if options.write_header {
                    writer.write_header(&field_names)?;
                }
                writer.write(&record)?;
                writer.close()?;
                files.push(path);
            }
            Ok(None) => break,
            Err(e) if e.is_recoverable() => {
                warn!("Skipping input record {}: {}", position, e);
                events.emit_event(&format!("Skipping input record {}: {}", position, e));
            }
            Err(e) => return Err(e.into()),
        }
    }
    reader.close();

    info!(
        "Split {:?} into {} {} records ({} extra fields)",
        input,
        files.len(),
        format,
        field_names.len()
    );
    Ok(files)
}
