//! Command Line Interface (CLI) layer.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration entry (`runner`) that turns command-line options into
//! a `RunConfig` and hands it to the library.
//!
//! If you are embedding the batch driver into another application, prefer
//! `auto3d_batch::process_file_to_path` over calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
