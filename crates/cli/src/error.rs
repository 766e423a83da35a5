//! CLI error type.

use hotmeal_client::{ClientError, StateError, StorageError};
use thiserror::Error;

/// Errors that end a command with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// Client state could not be assembled.
    #[error("Startup error: {0}")]
    State(#[from] StateError),

    /// A client operation failed.
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Local state could not be saved.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The command referred to something that does not exist.
    #[error("{0}")]
    NotFound(String),
}
