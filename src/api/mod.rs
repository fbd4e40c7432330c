//! High-level library API: run a whole batch from a combined input file to a single
//! output file. Prefer these entrypoints over the low-level `core` modules when
//! embedding the driver.
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::core::aggregate::Aggregator;
use crate::core::driver::{self, Engine, FailureKind, RecordOutcome};
use crate::core::params::RunConfig;
use crate::core::split::{split_records, split_structured};
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};
use crate::events::EventSink;
use crate::types::{InputFormat, SplitMode};

/// Batch run report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Records materialized by the splitter
    pub input_records: usize,
    pub succeeded: usize,
    /// Records skipped after a recoverable engine failure
    pub failed: usize,
    /// Separator-delimited records appended to the output
    pub output_records: usize,
}

/// Split `input` into per-record files inside `workspace` using the configured mode.
pub fn split_input(
    input: &Path,
    workspace: &Workspace,
    config: &RunConfig,
    events: &dyn EventSink,
) -> Result<Vec<PathBuf>> {
    match config.split_mode {
        SplitMode::Basic => split_records(input, workspace),
        SplitMode::Structured => split_structured(input, workspace, &config.record_io, events),
    }
}

fn skip_record(
    report: &mut RunReport,
    events: &dyn EventSink,
    index: usize,
    file: &Path,
    kind: FailureKind,
    detail: &str,
) {
    report.failed += 1;
    warn!("Record {} ({:?}) failed: {} error: {}", index, file, kind, detail);
    events.emit_event(&format!(
        "Record {} ({}) failed with {} error: {}",
        index,
        file.display(),
        kind,
        detail
    ));
}

/// Process every record of `input` with `engine` and append the results to `output`.
///
/// All records are split before the first engine call; records are then processed
/// one at a time in input order. Runtime, I/O and end-of-input engine failures skip
/// the record, as does an I/O error while appending its result to `output`; any
/// other engine failure stops the run with [`Error::Engine`].
pub fn process_file_to_path<E: Engine + ?Sized>(
    input: &Path,
    output: &Path,
    config: &RunConfig,
    engine: &mut E,
    events: &dyn EventSink,
) -> Result<RunReport> {
    let format = match InputFormat::from_path(input) {
        Ok(format) => format,
        Err(e) => {
            events.emit_event(&e.to_string());
            return Err(e);
        }
    };
    config.engine.validate()?;

    let workspace = Workspace::create(config.work_dir.as_deref())?;
    info!(
        "Splitting {} input {:?} into {:?}",
        format,
        input,
        workspace.path()
    );
    let files = split_input(input, &workspace, config, events)?;

    let mut report = RunReport {
        input_records: files.len(),
        ..RunReport::default()
    };
    let mut aggregator = Aggregator::new(output);

    for (i, file) in files.iter().enumerate() {
        let index = i + 1;
        info!("Processing record {}/{}: {:?}", index, files.len(), file);
        let options = config.engine.with_path(file);

        match driver::run_record(engine, &options) {
            RecordOutcome::Success { result } => match aggregator.append(&result) {
                Ok(count) => {
                    report.succeeded += 1;
                    info!("Record {} produced {} structures", index, count);
                }
                Err(Error::Io(e)) => {
                    let detail = format!("cannot append result {}: {}", result.display(), e);
                    skip_record(&mut report, events, index, file, FailureKind::Io, &detail);
                }
                Err(e) => return Err(e),
            },
            RecordOutcome::Recoverable { kind, detail } => {
                skip_record(&mut report, events, index, file, kind, &detail);
            }
            RecordOutcome::Fatal { detail } => {
                events.emit_event(&format!(
                    "Record {} ({}) failed with unrecoverable error: {}",
                    index,
                    file.display(),
                    detail
                ));
                return Err(Error::Engine {
                    index,
                    path: file.clone(),
                    detail,
                });
            }
        }
    }

    report.output_records = aggregator.finalize()?;
    events.emit_event(&format!(
        "{} output records from {} input records ({} failed)",
        report.output_records, report.input_records, report.failed
    ));
    events.emit_cost(report.output_records, false);

    if config.keep_workspace {
        let kept = workspace.keep();
        info!("Kept workspace at {:?}", kept);
    } else {
        workspace.close()?;
    }

    Ok(report)
}
