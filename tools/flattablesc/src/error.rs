//! CLI Error Types
//!
//! Every failure maps to a process exit code; library errors keep their own.

use flattables::CodegenError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Validation, generation or compiler failure from the library
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// Flag values that are well-formed but unusable together
    #[error("invalid {flag}: {message}")]
    Usage { flag: &'static str, message: String },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn usage(flag: &'static str, message: impl Into<String>) -> Self {
        Self::Usage {
            flag,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Codegen(e) => e.exit_code(),
            CliError::Usage { .. } => 2,
            CliError::Io(_) => 31,
            CliError::Json(_) => 32,
            CliError::Other(_) => 1,
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::Codegen(e) => e.hint(),
            CliError::Usage { .. } => Some("run 'flattablesc generate --help' for usage"),
            _ => None,
        }
    }
}

impl From<flattables::TablesError> for CliError {
    fn from(e: flattables::TablesError) -> Self {
        CliError::Codegen(e.into())
    }
}
