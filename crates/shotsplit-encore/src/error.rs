//! Error types for the Encore client.

use thiserror::Error;

/// Result type for Encore operations.
pub type EncoreResult<T> = Result<T, EncoreError>;

/// Errors that can occur while talking to the transcoding service.
#[derive(Debug, Error)]
pub enum EncoreError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{operation} returned unexpected status {status}")]
    UnexpectedStatus {
        operation: &'static str,
        status: reqwest::StatusCode,
    },

    /// The remote job reached its failure terminal status.
    #[error("remote job {id} failed: {message}")]
    RemoteJobFailed { id: String, message: String },

    /// The configured attempt ceiling was reached.
    #[error("{operation} still failing after {attempts} attempts")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
    },
}

impl EncoreError {
    /// Check if this error is worth retrying after a delay.
    ///
    /// Transport problems and unexpected HTTP statuses are; a failed remote
    /// job and an exhausted retry budget are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EncoreError::Network(_) | EncoreError::UnexpectedStatus { .. }
        )
    }
}
