//! Signer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Signing tool invocation errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("failed to launch signing tool '{tool}': {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("signing tool failed ({status})")]
    ToolFailed {
        /// Exit status description (code or terminating signal).
        status: String,
        /// Combined stderr/stdout of the tool, passed through opaquely.
        diagnostics: String,
    },

    #[error("signing tool reported success but produced no output at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for signing operations.
pub type SignerResult<T> = std::result::Result<T, SignerError>;
