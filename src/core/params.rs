use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{IsomerEngine, OmegaMode, OptimizingEngine, SplitMode, TautomerEngine};

/// Options handed verbatim to the structure-generation engine.
///
/// The driver only ever touches `path`; every other field is serialized as-is
/// into the options document the engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Input file for the current invocation; swapped per record
    pub path: PathBuf,
    /// Output the top-k structures per molecule
    pub k: Option<usize>,
    /// Output structures within this energy window (kcal/mol) of the lowest one
    pub window: Option<f64>,
    pub verbose: bool,
    pub job_name: String,
    pub enumerate_tautomer: bool,
    pub tauto_engine: TautomerEngine,
    #[serde(rename = "pKaNorm")]
    pub pka_norm: bool,
    pub isomer_engine: IsomerEngine,
    pub enumerate_isomer: bool,
    pub mode_oe: OmegaMode,
    pub mpi_np: usize,
    pub max_confs: Option<usize>,
    pub use_gpu: bool,
    pub gpu_idx: Vec<usize>,
    /// Molecules handled per GB of memory
    pub capacity: usize,
    pub optimizing_engine: OptimizingEngine,
    pub patience: usize,
    pub opt_steps: usize,
    pub convergence_threshold: f64,
    /// RMSD below which two conformers are duplicates
    pub threshold: f64,
    /// Memory assigned to the engine in GB
    pub memory: Option<usize>,
    pub batchsize_atoms: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            k: Some(1),
            window: None,
            verbose: false,
            job_name: String::new(),
            enumerate_tautomer: false,
            tauto_engine: TautomerEngine::Rdkit,
            pka_norm: true,
            isomer_engine: IsomerEngine::Rdkit,
            enumerate_isomer: true,
            mode_oe: OmegaMode::Classic,
            mpi_np: 4,
            max_confs: None,
            use_gpu: false,
            gpu_idx: vec![0],
            capacity: 42,
            optimizing_engine: OptimizingEngine::Aimnet,
            patience: 1000,
            opt_steps: 5000,
            convergence_threshold: 0.003,
            threshold: 0.3,
            memory: None,
            batchsize_atoms: 1024,
        }
    }
}

impl EngineOptions {
    /// Copy of these options pointed at a single record file.
    pub fn with_path(&self, path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        match (self.k, self.window) {
            (Some(0), _) => Err(Error::InvalidArgument {
                arg: "k",
                value: "0".to_string(),
            }),
            (_, Some(w)) if !(w > 0.0) => Err(Error::InvalidArgument {
                arg: "window",
                value: w.to_string(),
            }),
            (None, None) => Err(Error::InvalidArgument {
                arg: "k",
                value: "none (one of k or window is required)".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Settings for the structured splitter's record reader and writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordIoOptions {
    /// Column delimiter for delimited text (SMILES) files
    pub delimiter: char,
    /// First line of a delimited input holds the field names
    pub read_header: bool,
    /// Emit a field-name header line at the top of each record file
    pub write_header: bool,
    /// Identity column, as a 0-based index or a header name
    pub id_column: Option<String>,
    /// Records inspected up front to collect the extra field names
    pub sniff_records: usize,
}

impl Default for RecordIoOptions {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            read_header: false,
            write_header: false,
            id_column: None,
            sniff_records: 50,
        }
    }
}

/// Full configuration of one batch run, suitable for config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunConfig {
    pub engine: EngineOptions,
    pub split_mode: SplitMode,
    pub record_io: RecordIoOptions,
    /// Base directory for the per-run workspace; system temp dir when unset
    pub work_dir: Option<PathBuf>,
    /// Leave the workspace on disk after the run
    pub keep_workspace: bool,
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
