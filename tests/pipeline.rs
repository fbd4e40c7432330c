use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use auto3d_batch::{
    Engine, EngineError, EngineOptions, Error, EventLog, RecordIoOptions, RunConfig, SplitMode,
    process_file_to_path,
};

#[derive(Clone, Copy)]
enum Failure {
    Runtime,
    Io,
    Eof,
    Fatal,
    /// Reports a result path that exists but cannot be read.
    UnreadableResult(&'static str),
}

/// In-process stand-in for the structure engine: turns the first token of each
/// record file into a minimal SDF entry.
struct FakeEngine {
    results: PathBuf,
    failures: HashMap<usize, Failure>,
    inputs: Vec<String>,
    releases: usize,
}

impl FakeEngine {
    fn new(results: &Path) -> Self {
        fs::create_dir_all(results).unwrap();
        Self {
            results: results.to_path_buf(),
            failures: HashMap::new(),
            inputs: Vec::new(),
            releases: 0,
        }
    }

    fn failing(mut self, index: usize, failure: Failure) -> Self {
        self.failures.insert(index, failure);
        self
    }
}

impl Engine for FakeEngine {
    fn generate(&mut self, options: &EngineOptions) -> Result<PathBuf, EngineError> {
        let content = fs::read_to_string(&options.path).map_err(EngineError::from)?;
        self.inputs.push(content.clone());
        let index = self.inputs.len();

        match self.failures.get(&index) {
            Some(Failure::Runtime) => return Err(EngineError::Runtime("CUDA error".into())),
            Some(Failure::Io) => return Err(EngineError::Io("truncated optimization".into())),
            Some(Failure::Eof) => return Err(EngineError::UnexpectedEof("Ran out of input".into())),
            Some(Failure::Fatal) => return Err(EngineError::Other("ValueError: bad".into())),
            Some(Failure::UnreadableResult(path)) => return Ok(PathBuf::from(*path)),
            None => {}
        }

        let name = content
            .lines()
            .last()
            .and_then(|l| l.split_whitespace().next())
            .unwrap_or("unnamed");
        let result = self.results.join(format!("result_{}.sdf", index));
        fs::write(
            &result,
            format!(
                "{}\n  fake3d\n\n  0  0  0  0  0  0  0  0  0  0999 V2000\nM  END\n$$$$\n",
                name
            ),
        )
        .map_err(EngineError::from)?;
        Ok(result)
    }

    fn release(&mut self) {
        self.releases += 1;
    }
}

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn config(&self) -> RunConfig {
        RunConfig {
            work_dir: Some(self.path("work")),
            ..RunConfig::default()
        }
    }

    fn workspaces(&self) -> usize {
        fs::read_dir(self.path("work"))
            .map(|d| d.count())
            .unwrap_or(0)
    }
}

fn entry(name: &str) -> String {
    format!(
        "{}\n  fake3d\n\n  0  0  0  0  0  0  0  0  0  0999 V2000\nM  END\n$$$$\n",
        name
    )
}

const FIVE: &str = "CCO m1\nCCN m2\nCCC m3\nCCF m4\nCCCl m5\n";

#[test]
fn recoverable_failures_are_excluded_from_output() {
    let fx = Fixture::new();
    let input = fx.write("mols.smi", FIVE);
    let output = fx.path("result.sdf");
    let mut engine = FakeEngine::new(&fx.path("results"))
        .failing(2, Failure::Runtime)
        .failing(4, Failure::Io);
    let events = EventLog::new();

    let report = process_file_to_path(&input, &output, &fx.config(), &mut engine, &events).unwrap();

    assert_eq!(report.input_records, 5);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 2);
    assert_eq!(report.output_records, 3);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        [entry("CCO"), entry("CCC"), entry("CCCl")].concat()
    );
    assert_eq!(engine.releases, 5);

    let messages = events.messages();
    assert!(messages.iter().any(|m| m.starts_with("Record 2 (") && m.contains("runtime error")));
    assert!(messages.iter().any(|m| m.starts_with("Record 4 (") && m.contains("I/O error")));
    assert_eq!(
        messages.last().map(String::as_str),
        Some("3 output records from 5 input records (2 failed)")
    );
    assert_eq!(events.last_cost(), Some(3));
}

#[test]
fn end_of_input_failure_is_recoverable() {
    let fx = Fixture::new();
    let input = fx.write("mols.smi", "CCO m1\nCCN m2\n");
    let mut engine = FakeEngine::new(&fx.path("results")).failing(1, Failure::Eof);
    let report = process_file_to_path(
        &input,
        &fx.path("out.sdf"),
        &fx.config(),
        &mut engine,
        &EventLog::new(),
    )
    .unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.output_records, 1);
}

#[cfg(target_os = "linux")]
#[test]
fn unreadable_result_is_skipped_like_an_io_failure() {
    let fx = Fixture::new();
    let input = fx.write("mols.smi", "CCO m1\nCCN m2\n");
    let output = fx.path("result.sdf");
    // a regular file whose reads fail with EIO
    let mut engine =
        FakeEngine::new(&fx.path("results")).failing(1, Failure::UnreadableResult("/proc/self/mem"));
    let events = EventLog::new();

    let report = process_file_to_path(&input, &output, &fx.config(), &mut engine, &events).unwrap();

    assert_eq!(engine.inputs.len(), 2);
    assert_eq!(engine.releases, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.output_records, 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), entry("CCN"));
    let messages = events.messages();
    assert!(messages[0].starts_with("Record 1 (") && messages[0].contains("I/O error"));
    assert!(messages[0].contains("/proc/self/mem"));
    assert_eq!(
        messages.last().map(String::as_str),
        Some("1 output records from 2 input records (1 failed)")
    );
}

#[test]
fn unrecognized_failure_stops_the_run() {
    let fx = Fixture::new();
    let input = fx.write("mols.smi", FIVE);
    let output = fx.path("result.sdf");
    let mut engine = FakeEngine::new(&fx.path("results")).failing(3, Failure::Fatal);
    let events = EventLog::new();

    let err = process_file_to_path(&input, &output, &fx.config(), &mut engine, &events).unwrap_err();

    match err {
        Error::Engine { index, path, detail } => {
            assert_eq!(index, 3);
            assert!(path.ends_with("input_3.smi"));
            assert_eq!(detail, "ValueError: bad");
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(engine.inputs.len(), 3);
    assert_eq!(engine.releases, 3);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        [entry("CCO"), entry("CCN")].concat()
    );
    assert_eq!(events.last_cost(), None);
    // the workspace is dropped along with the failed run
    assert_eq!(fx.workspaces(), 0);
}

#[test]
fn unknown_extension_fails_before_any_work() {
    let fx = Fixture::new();
    let input = fx.write("mols.mol2", FIVE);
    let mut engine = FakeEngine::new(&fx.path("results"));
    let events = EventLog::new();

    let err = process_file_to_path(&input, &fx.path("out.sdf"), &fx.config(), &mut engine, &events)
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedExtension { ref ext } if ext == ".mol2"));
    assert!(engine.inputs.is_empty());
    assert_eq!(fx.workspaces(), 0);
    assert!(!fx.path("out.sdf").exists());
    assert_eq!(events.messages().len(), 1);
}

#[test]
fn rerun_into_fresh_outputs_is_identical() {
    let fx = Fixture::new();
    let input = fx.write("mols.smi", FIVE);

    let mut first = FakeEngine::new(&fx.path("results_a")).failing(2, Failure::Runtime);
    let mut second = FakeEngine::new(&fx.path("results_b")).failing(2, Failure::Runtime);
    let report_a = process_file_to_path(
        &input,
        &fx.path("a.sdf"),
        &fx.config(),
        &mut first,
        &EventLog::new(),
    )
    .unwrap();
    let report_b = process_file_to_path(
        &input,
        &fx.path("b.sdf"),
        &fx.config(),
        &mut second,
        &EventLog::new(),
    )
    .unwrap();

    assert_eq!(report_a, report_b);
    assert_eq!(
        fs::read(fx.path("a.sdf")).unwrap(),
        fs::read(fx.path("b.sdf")).unwrap()
    );
}

#[test]
fn sdf_input_is_split_on_record_markers() {
    let fx = Fixture::new();
    let sdf = [entry("first"), entry("second")].concat();
    let input = fx.write("mols.sdf", &format!("{}dangling\n", sdf));
    let mut engine = FakeEngine::new(&fx.path("results"));

    let report = process_file_to_path(
        &input,
        &fx.path("out.sdf"),
        &fx.config(),
        &mut engine,
        &EventLog::new(),
    )
    .unwrap();

    assert_eq!(report.input_records, 2);
    assert_eq!(engine.inputs, vec![entry("first"), entry("second")]);
}

#[test]
fn structured_mode_writes_header_into_every_record_file() {
    let fx = Fixture::new();
    let input = fx.write(
        "mols.smi",
        "smiles\tname\tMW\tlogP\nCCO\tethanol\t46.07\t-0.31\n\tbroken\t1\t1\nC\tmethane\t16.04\t1.09\n",
    );
    let config = RunConfig {
        split_mode: SplitMode::Structured,
        record_io: RecordIoOptions {
            read_header: true,
            write_header: true,
            id_column: Some("name".to_string()),
            ..RecordIoOptions::default()
        },
        ..fx.config()
    };
    let mut engine = FakeEngine::new(&fx.path("results"));
    let events = EventLog::new();

    let report =
        process_file_to_path(&input, &fx.path("out.sdf"), &config, &mut engine, &events).unwrap();

    assert_eq!(report.input_records, 2);
    assert_eq!(
        engine.inputs,
        vec![
            "smiles\tid\tMW\tlogP\nCCO\tethanol\t46.07\t-0.31\n".to_string(),
            "smiles\tid\tMW\tlogP\nC\tmethane\t16.04\t1.09\n".to_string(),
        ]
    );
    assert!(events.messages()[0].starts_with("Skipping input record 2"));
}

#[test]
fn workspace_is_removed_unless_kept() {
    let fx = Fixture::new();
    let input = fx.write("mols.smi", "CCO m1\n");
    let mut engine = FakeEngine::new(&fx.path("results"));
    process_file_to_path(
        &input,
        &fx.path("out.sdf"),
        &fx.config(),
        &mut engine,
        &EventLog::new(),
    )
    .unwrap();
    assert_eq!(fx.workspaces(), 0);

    let config = RunConfig {
        keep_workspace: true,
        ..fx.config()
    };
    process_file_to_path(&input, &fx.path("out2.sdf"), &config, &mut engine, &EventLog::new())
        .unwrap();
    assert_eq!(fx.workspaces(), 1);
}

#[cfg(unix)]
#[test]
fn output_gets_group_writable_mode_even_when_empty() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    let input = fx.write("mols.smi", "CCO m1\n");
    let output = fx.path("out.sdf");
    let mut engine = FakeEngine::new(&fx.path("results")).failing(1, Failure::Runtime);
    let report =
        process_file_to_path(&input, &output, &fx.config(), &mut engine, &EventLog::new()).unwrap();

    assert_eq!(report.output_records, 0);
    assert_eq!(fs::read(&output).unwrap(), b"");
    let mode = fs::metadata(&output).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o664);
}
