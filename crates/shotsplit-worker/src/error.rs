//! Worker error types.

use shotsplit_models::{InvalidJobId, JobId};
use thiserror::Error;
use validator::ValidationErrors;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Request parameters out of range; rejected at the boundary.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    InvalidJobId(#[from] InvalidJobId),

    #[error("job {0} does not exist")]
    JobNotFound(JobId),

    #[error("not a valid input location: {0}")]
    InvalidSource(String),

    #[error("media error: {0}")]
    Media(#[from] shotsplit_media::MediaError),

    #[error("transcoding service error: {0}")]
    Encore(#[from] shotsplit_encore::EncoreError),

    #[error("store error: {0}")]
    Store(#[from] shotsplit_store::StoreError),
}

impl WorkerError {
    /// Check if this error was raised synchronously at the boundary, before
    /// any background work started.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            WorkerError::Validation(_)
                | WorkerError::InvalidJobId(_)
                | WorkerError::JobNotFound(_)
                | WorkerError::InvalidSource(_)
        )
    }
}
