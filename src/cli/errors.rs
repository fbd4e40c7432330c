use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid delimiter: {value:?}. Use tab, space, comma, semicolon, pipe or a single ASCII character")]
    InvalidDelimiter { value: String },

    #[error("Only one of {first} and {second} may be given")]
    ConflictingArguments {
        first: &'static str,
        second: &'static str,
    },

    #[error(transparent)]
    Run(#[from] auto3d_batch::Error),
}
