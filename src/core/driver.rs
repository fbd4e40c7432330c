//! Per-record engine invocation and failure classification.
//!
//! Every engine call is wrapped so that [`Engine::release`] runs on all exit
//! paths, and its result is mapped onto a [`RecordOutcome`] in one place.
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::core::params::EngineOptions;

/// The external structure-generation engine.
pub trait Engine {
    /// Generate and optimize structures for the file at `options.path`,
    /// returning the path of the result file.
    fn generate(&mut self, options: &EngineOptions) -> Result<PathBuf, EngineError>;

    /// Return device memory and other per-call resources. Called after every
    /// `generate`, whatever its outcome.
    fn release(&mut self) {}
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("runtime failure: {0}")]
    Runtime(String),

    #[error("I/O failure: {0}")]
    Io(String),

    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),

    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => EngineError::UnexpectedEof(e.to_string()),
            _ => EngineError::Io(e.to_string()),
        }
    }
}

/// Engine failures known to concern only the record being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Runtime,
    Io,
    UnexpectedEof,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Runtime => write!(f, "runtime"),
            FailureKind::Io => write!(f, "I/O"),
            FailureKind::UnexpectedEof => write!(f, "end-of-input"),
        }
    }
}

impl EngineError {
    pub fn recoverable_kind(&self) -> Option<FailureKind> {
        match self {
            EngineError::Runtime(_) => Some(FailureKind::Runtime),
            EngineError::Io(_) => Some(FailureKind::Io),
            EngineError::UnexpectedEof(_) => Some(FailureKind::UnexpectedEof),
            EngineError::Other(_) => None,
        }
    }

    fn detail(self) -> String {
        match self {
            EngineError::Runtime(d)
            | EngineError::Io(d)
            | EngineError::UnexpectedEof(d)
            | EngineError::Other(d) => d,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Success { result: PathBuf },
    Recoverable { kind: FailureKind, detail: String },
    Fatal { detail: String },
}

pub fn classify(result: Result<PathBuf, EngineError>) -> RecordOutcome {
    match result {
        Ok(result) => RecordOutcome::Success { result },
        Err(e) => match e.recoverable_kind() {
            Some(kind) => RecordOutcome::Recoverable {
                kind,
                detail: e.detail(),
            },
            None => RecordOutcome::Fatal { detail: e.detail() },
        },
    }
}

struct ReleaseGuard<'a, E: Engine + ?Sized> {
    engine: &'a mut E,
}

impl<E: Engine + ?Sized> Drop for ReleaseGuard<'_, E> {
    fn drop(&mut self) {
        self.engine.release();
        debug!("Engine resources released");
    }
}

/// Run the engine once for the record named by `options.path`.
pub fn run_record<E: Engine + ?Sized>(engine: &mut E, options: &EngineOptions) -> RecordOutcome {
    let result = {
        let guard = ReleaseGuard { engine };
        guard.engine.generate(options).and_then(|path| {
            if path.is_file() {
                Ok(path)
            } else {
                Err(EngineError::Io(format!(
                    "result file {:?} does not exist",
                    path
                )))
            }
        })
    };
    classify(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    enum Step {
        Succeed(PathBuf),
        Fail(fn() -> EngineError),
        Panic,
    }

    struct ScriptedEngine {
        step: Step,
        releases: usize,
    }

    impl Engine for ScriptedEngine {
        fn generate(&mut self, _options: &EngineOptions) -> Result<PathBuf, EngineError> {
            match &self.step {
                Step::Succeed(p) => Ok(p.clone()),
                Step::Fail(make) => Err(make()),
                Step::Panic => panic!("engine crashed"),
            }
        }

        fn release(&mut self) {
            self.releases += 1;
        }
    }

    fn engine(step: Step) -> ScriptedEngine {
        ScriptedEngine { step, releases: 0 }
    }

    #[test]
    fn three_kinds_are_recoverable_others_fatal() {
        let cases: [(EngineError, Option<FailureKind>); 4] = [
            (EngineError::Runtime("cuda".into()), Some(FailureKind::Runtime)),
            (EngineError::Io("truncated".into()), Some(FailureKind::Io)),
            (
                EngineError::UnexpectedEof("eof".into()),
                Some(FailureKind::UnexpectedEof),
            ),
            (EngineError::Other("ValueError".into()), None),
        ];
        for (err, expected) in cases {
            match (classify(Err(err)), expected) {
                (RecordOutcome::Recoverable { kind, .. }, Some(k)) => assert_eq!(kind, k),
                (RecordOutcome::Fatal { detail }, None) => assert_eq!(detail, "ValueError"),
                (outcome, _) => panic!("unexpected outcome {:?}", outcome),
            }
        }
    }

    #[test]
    fn io_error_kinds_map_to_engine_failures() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        assert!(matches!(EngineError::from(eof), EngineError::UnexpectedEof(_)));
        let other = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(EngineError::from(other), EngineError::Io(_)));
    }

    #[test]
    fn release_runs_after_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = dir.path().join("out.sdf");
        std::fs::write(&result, "$$$$\n").unwrap();
        let opts = EngineOptions::default();

        let mut ok = engine(Step::Succeed(result.clone()));
        assert_eq!(run_record(&mut ok, &opts), RecordOutcome::Success { result });
        assert_eq!(ok.releases, 1);

        let mut failing = engine(Step::Fail(|| EngineError::Other("boom".into())));
        assert!(matches!(
            run_record(&mut failing, &opts),
            RecordOutcome::Fatal { .. }
        ));
        assert_eq!(failing.releases, 1);
    }

    #[test]
    fn missing_result_file_is_an_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut e = engine(Step::Succeed(dir.path().join("never-written.sdf")));
        let outcome = run_record(&mut e, &EngineOptions::default());
        assert!(matches!(
            outcome,
            RecordOutcome::Recoverable {
                kind: FailureKind::Io,
                ..
            }
        ));
    }

    #[test]
    fn release_runs_when_engine_panics() {
        let mut e = engine(Step::Panic);
        let opts = EngineOptions::default();
        let outcome = catch_unwind(AssertUnwindSafe(|| run_record(&mut e, &opts)));
        assert!(outcome.is_err());
        assert_eq!(e.releases, 1);
    }
}
