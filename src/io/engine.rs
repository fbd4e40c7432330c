//! Subprocess adapter for the structure-generation engine.
//!
//! Each record runs the configured program once with the path of a JSON options
//! document as its last argument. The program prints the result file path as the
//! last non-empty line on stdout. On failure, the final exception line on stderr
//! (e.g. `OSError: [Errno 5] ...`) decides how the failure is classified.
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::core::driver::{Engine, EngineError};
use crate::core::params::EngineOptions;

const RUNTIME_ERRORS: &[&str] = &[
    "RuntimeError",
    "NotImplementedError",
    "RecursionError",
    "OutOfMemoryError",
];

const IO_ERRORS: &[&str] = &[
    "OSError",
    "IOError",
    "EnvironmentError",
    "FileNotFoundError",
    "FileExistsError",
    "PermissionError",
    "IsADirectoryError",
    "NotADirectoryError",
    "InterruptedError",
    "BlockingIOError",
    "ChildProcessError",
    "ConnectionError",
    "BrokenPipeError",
    "TimeoutError",
    "UnsupportedOperation",
];

const EOF_ERRORS: &[&str] = &["EOFError"];

/// Lines of engine stderr kept in the debug log after a successful run.
const STDERR_TAIL_LINES: usize = 20;

/// Runs an external engine program once per record.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    invocations: usize,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            invocations: 0,
        }
    }

    /// Arguments placed before the options document path.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn invocations(&self) -> usize {
        self.invocations
    }
}

impl Engine for CommandEngine {
    fn generate(&mut self, options: &EngineOptions) -> Result<PathBuf, EngineError> {
        let document = options.path.with_extension("json");
        let json = serde_json::to_vec_pretty(options)
            .map_err(|e| EngineError::Other(format!("cannot encode engine options: {}", e)))?;
        fs::write(&document, json).map_err(|e| {
            EngineError::Other(format!("cannot write options to {:?}: {}", document, e))
        })?;

        info!("Running {} on {:?}", self.program, options.path);
        let output = Command::new(&self.program)
            .args(self.args.iter().map(|s| s.as_str()))
            .arg(&document)
            .output()
            .map_err(|e| EngineError::Other(format!("{} exec error: {}", self.program, e)))?;
        self.invocations += 1;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(classify_failure(&stderr, output.status.code()));
        }

        if let Some(tail) = tail_lines(&stderr, STDERR_TAIL_LINES) {
            debug!("{} stderr:\n{}", self.program, tail);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let result = last_line(&stdout)
            .ok_or_else(|| EngineError::Io("engine reported no result path".to_string()))?;
        Ok(PathBuf::from(result))
    }

    fn release(&mut self) {
        // The engine process has exited, so the OS has already reclaimed its device memory.
        debug!("{} invocation {} finished", self.program, self.invocations);
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

/// The last `n` non-empty lines of `text`, or `None` if there are none.
fn tail_lines(text: &str, n: usize) -> Option<String> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    (start < lines.len()).then(|| lines[start..].join("\n"))
}

/// Exception class named at the start of a traceback's final line,
/// without its module path.
fn exception_name(line: &str) -> Option<&str> {
    let head = line.split(':').next()?.trim();
    let name = head.rsplit('.').next()?;
    let valid = !name.is_empty()
        && !head.contains(char::is_whitespace)
        && head
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    valid.then_some(name)
}

/// Map a failed engine run onto an [`EngineError`].
///
/// `code` is `None` when the process was terminated by a signal, which is
/// never treated as recoverable.
pub fn classify_failure(stderr: &str, code: Option<i32>) -> EngineError {
    let last = last_line(stderr).unwrap_or_default();
    let detail = if last.is_empty() {
        match code {
            Some(c) => format!("engine exited with status {}", c),
            None => "engine terminated by signal".to_string(),
        }
    } else {
        last.to_string()
    };

    if code.is_none() {
        return EngineError::Other(detail);
    }
    match exception_name(last) {
        Some(name) if RUNTIME_ERRORS.contains(&name) => EngineError::Runtime(detail),
        Some(name) if IO_ERRORS.contains(&name) => EngineError::Io(detail),
        Some(name) if EOF_ERRORS.contains(&name) => EngineError::UnexpectedEof(detail),
        _ => EngineError::Other(detail),
    }
}
