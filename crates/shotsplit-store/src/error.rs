//! Error types for the store.

use shotsplit_models::{JobId, JobStatus};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur at the persistence boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("job {0} does not exist")]
    JobNotFound(JobId),

    /// A caller asked for a transition the state machine does not allow.
    ///
    /// This is a programming error in the caller, not a user-facing
    /// condition; the row is left untouched.
    #[error("illegal status transition {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// A stored row no longer maps onto the model types.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}
