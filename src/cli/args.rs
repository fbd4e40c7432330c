use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use auto3d_batch::{IsomerEngine, OmegaMode, OptimizingEngine, TautomerEngine};

/// Where run events and the final cost are reported
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum EventFormat {
    /// Through the tracing log (visible with --log)
    Tracing,
    /// Timestamped -EVENT-/-COST- lines on stdout
    Dmlog,
}

#[derive(Parser, Debug)]
#[command(name = "auto3d-batch", version, about = "Batch 3D structure generation, one record at a time")]
pub struct CliArgs {
    /// A .smi/.smiles or .sdf/.sd file holding all molecules and IDs
    pub path: PathBuf,

    /// The output file; results are appended to it
    #[arg(long, default_value = "result.sdf")]
    pub output: PathBuf,

    /// Load the run configuration from a JSON file; engine and record options
    /// given on the command line are then ignored
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Outputs the top-k structures for each molecule [default: 1]
    #[arg(long)]
    pub k: Option<usize>,

    /// Outputs the structures whose energies are within this window (kcal/mol)
    /// of the lowest-energy conformer. Only one of --k and --window may be given
    #[arg(long)]
    pub window: Option<f64>,

    /// Save all metadata while running
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// A folder name to save all metadata
    #[arg(long, default_value = "")]
    pub job_name: String,

    /// Enumerate tautomers for the input
    #[arg(long, default_value_t = false)]
    pub enumerate_tautomer: bool,

    /// Program used to enumerate tautomers
    #[arg(long, value_enum, default_value_t = TautomerEngine::Rdkit)]
    pub tauto_engine: TautomerEngine,

    /// Do not assign each tautomer its predominant ionization state at pH ~7.4
    /// (only used with --tauto-engine oechem)
    #[arg(long, default_value_t = false)]
    pub no_pka_norm: bool,

    /// The program for generating 3D isomers for each molecule
    #[arg(long, value_enum, default_value_t = IsomerEngine::Rdkit)]
    pub isomer_engine: IsomerEngine,

    /// Do not enumerate cis/trans and R/S isomers
    #[arg(long, default_value_t = false)]
    pub no_enumerate_isomer: bool,

    /// The mode the omega program will take
    #[arg(long, value_enum, default_value_t = OmegaMode::Classic)]
    pub mode_oe: OmegaMode,

    /// Number of CPU cores for the isomer generation engine
    #[arg(long, default_value_t = 4)]
    pub mpi_np: usize,

    /// Maximum number of isomers for each molecule
    #[arg(long)]
    pub max_confs: Option<usize>,

    /// Use GPU when available
    #[arg(long, default_value_t = false)]
    pub use_gpu: bool,

    /// GPU index (one or more)
    #[arg(long, num_args = 1.., default_values_t = [0usize])]
    pub gpu_idx: Vec<usize>,

    /// Number of molecules the model handles per 1 GB of memory
    #[arg(long, default_value_t = 42)]
    pub capacity: usize,

    /// Engine for energy calculation and geometry optimization
    #[arg(long, value_enum, default_value_t = OptimizingEngine::Aimnet)]
    pub optimizing_engine: OptimizingEngine,

    /// Steps without force decrease before a conformer drops out of optimization
    #[arg(long, default_value_t = 1000)]
    pub patience: usize,

    /// Maximum optimization steps for each structure
    #[arg(long, default_value_t = 5000)]
    pub opt_steps: usize,

    /// Optimization converges when the maximum force is below this threshold
    #[arg(long, default_value_t = 0.003)]
    pub convergence_threshold: f64,

    /// Conformers within this RMSD of each other are duplicates
    #[arg(long, default_value_t = 0.3)]
    pub threshold: f64,

    /// The RAM size assigned to the engine (GB)
    #[arg(long)]
    pub memory: Option<usize>,

    /// The number of atoms in one optimization batch per 1 GB
    #[arg(long, default_value_t = 1024)]
    pub batchsize_atoms: usize,

    /// Parse each record and write it back out instead of splitting byte-for-byte
    #[arg(long, default_value_t = false)]
    pub structured: bool,

    /// Column delimiter for SMILES files: tab, space, comma, semicolon, pipe or a
    /// single character
    #[arg(long, default_value = "tab")]
    pub delimiter: String,

    /// The first line of a SMILES input holds field names
    #[arg(long, default_value_t = false)]
    pub read_header: bool,

    /// Write a field-name header line into each record file
    #[arg(long, default_value_t = false)]
    pub write_header: bool,

    /// Identity column: a 0-based column index or header name (SMILES), or a
    /// property name (SDF)
    #[arg(long)]
    pub id_column: Option<String>,

    /// Number of records read ahead to collect field names
    #[arg(long, default_value_t = 50)]
    pub sniff_records: usize,

    /// Base directory for the per-run workspace (defaults to the system temp dir)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Keep the per-run workspace after the run
    #[arg(long, default_value_t = false)]
    pub keep_workspace: bool,

    /// Engine program, run once per record with the options document path as its
    /// last argument
    #[arg(long, default_value = "auto3d-engine")]
    pub engine_cmd: String,

    /// Extra argument passed to the engine program before the options document
    /// (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Event reporting style
    #[arg(long, value_enum, default_value_t = EventFormat::Tracing)]
    pub events: EventFormat,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
