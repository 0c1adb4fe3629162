//! Error types for calls against the store backend.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single backend call.
///
/// Every variant is recoverable: the query dispatcher answers from the local
/// matcher and the conversation session substitutes an apology turn. The
/// detail carried here is for logs only and never reaches the end user.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No response at all (connection refused, DNS, timeout)
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The body did not have the expected shape
    #[error("malformed payload: {0}")]
    Payload(String),

    /// The requested app does not exist
    #[error("app not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// True when the backend was never reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, StoreError::Transport(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Payload(err.to_string())
        } else {
            StoreError::Transport(err)
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Payload(err.to_string())
    }
}
