#![doc = r#"
auto3d-batch — drive a 3D structure-generation engine over a multi-record molecule file.

The crate splits a combined SMILES (`.smi`/`.smiles`) or SDF (`.sdf`/`.sd`) file into
one file per record, runs an external structure-generation/optimization engine once
per record, and appends every successful result onto a single output file. Structure
generation itself is delegated entirely to the engine.

Records are processed sequentially. Runtime, I/O and end-of-input failures of the
engine skip the affected record; any other engine failure stops the run.

Quick start: run a batch through an engine program
--------------------------------------------------
```rust,no_run
use std::path::Path;
use auto3d_batch::{process_file_to_path, CommandEngine, RunConfig, TracingEvents};

fn main() -> auto3d_batch::Result<()> {
    let config = RunConfig::default();
    let mut engine = CommandEngine::new("auto3d-engine");

    let report = process_file_to_path(
        Path::new("/data/molecules.smi"),
        Path::new("/out/result.sdf"),
        &config,
        &mut engine,
        &TracingEvents,
    )?;

    println!(
        "{} output records from {} input records ({} failed)",
        report.output_records, report.input_records, report.failed
    );
    Ok(())
}
```

Plugging in your own engine
---------------------------
```rust
use std::path::PathBuf;
use auto3d_batch::{Engine, EngineError, EngineOptions};

struct InProcess;

impl Engine for InProcess {
    fn generate(&mut self, options: &EngineOptions) -> Result<PathBuf, EngineError> {
        // generate structures for `options.path` and return the result file
        Err(EngineError::Runtime(format!("not implemented for {:?}", options.path)))
    }

    fn release(&mut self) {
        // free device memory here; called after every `generate`
    }
}
```

Structured splitting
--------------------
```rust,no_run
use auto3d_batch::{RecordIoOptions, RunConfig, SplitMode};

let config = RunConfig {
    split_mode: SplitMode::Structured,
    record_io: RecordIoOptions {
        read_header: true,
        write_header: true,
        id_column: Some("name".to_string()),
        ..RecordIoOptions::default()
    },
    ..RunConfig::default()
};
```

Error handling
--------------
All public functions return `auto3d_batch::Result<T>`; match on `auto3d_batch::Error`
to tell configuration problems from fatal engine failures.

```rust,no_run
use std::path::Path;
use auto3d_batch::{process_file_to_path, CommandEngine, Error, EventLog, RunConfig};

let mut engine = CommandEngine::new("auto3d-engine");
let events = EventLog::new();
match process_file_to_path(
    Path::new("in.mol2"),
    Path::new("out.sdf"),
    &RunConfig::default(),
    &mut engine,
    &events,
) {
    Ok(report) => println!("{:?}", report),
    Err(Error::UnsupportedExtension { ext }) => eprintln!("unsupported input {ext}"),
    Err(Error::Engine { index, detail, .. }) => eprintln!("record {index}: {detail}"),
    Err(other) => eprintln!("{other}"),
}
```

Useful modules
--------------
- [`api`] — the batch orchestrator.
- [`core`] — splitting, engine driving, aggregation, parameters and workspace.
- [`io`] — molecule record reader/writer and the subprocess engine adapter.
- [`events`] — event/cost sinks.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod events;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::{EngineOptions, RecordIoOptions, RunConfig};
pub use error::{Error, Result};
pub use types::{
    InputFormat, IsomerEngine, OmegaMode, OptimizingEngine, SplitMode, TautomerEngine,
};

// Engine seam
pub use crate::core::driver::{Engine, EngineError, FailureKind, RecordOutcome};
pub use io::engine::CommandEngine;

// Records
pub use io::records::{Record, RecordError, RecordReader, RecordWriter};

// Events
pub use events::{DmLogEvents, EventLog, EventSink, TracingEvents};

// High-level API re-exports
pub use api::{RunReport, process_file_to_path, split_input};
