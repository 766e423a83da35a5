//! Error taxonomy for the client core.
//!
//! Every failure surfaced to the UI layer is one of the [`ClientError`]
//! variants. Classification of HTTP responses into these variants happens in
//! one place, [`crate::request::RequestClient`].

use thiserror::Error;

use crate::storage::StorageError;

/// Generic message shown when the backend does not supply one.
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";

/// Message shown for 5xx responses and transport failures.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error";

/// Message shown when the credential was rejected.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in first";

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend rejected the credential (401). The session has already
    /// been torn down when this is returned.
    #[error("authentication required")]
    Auth,

    /// The backend refused the request (4xx other than 401).
    #[error("request rejected ({status}): {message}")]
    Business {
        /// HTTP status code.
        status: u16,
        /// Server-supplied message, or a generic one.
        message: String,
    },

    /// 5xx response, timeout, or connection failure. Never retried.
    #[error("network error: {0}")]
    Network(String),

    /// Input rejected locally before any network attempt.
    #[error("validation error: {0}")]
    Validation(String),

    /// A success response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Persisted state could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Text suitable for a transient notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth => LOGIN_REQUIRED_MESSAGE.to_string(),
            Self::Business { message, .. } => message.clone(),
            Self::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Decode(_) | Self::Storage(_) => REQUEST_FAILED_MESSAGE.to_string(),
        }
    }

    /// HTTP status associated with the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth => Some(401),
            Self::Business { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;
