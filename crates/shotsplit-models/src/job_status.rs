//! Job lifecycle status and the allowed transition table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a transcoding job.
///
/// The four forward statuses mirror the pipeline stages. `Failed` is a
/// terminal status entered when the job's background task dies; it carries no
/// data itself, the cause lives on the job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted and persisted, background task not yet past segmentation
    #[default]
    Created,
    /// Source split into shots
    Processing,
    /// Shots and audio handed to the transcoding service
    Transcoding,
    /// Outputs reassembled and remuxed
    Completed,
    /// Background task died; see the job's failure reason
    Failed,
}

/// Raised when a stored status string is not one of the known values.
#[derive(Debug, Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl JobStatus {
    /// The forward path a successful job walks through, oldest first.
    pub const ORDER: [JobStatus; 4] = [
        JobStatus::Created,
        JobStatus::Processing,
        JobStatus::Transcoding,
        JobStatus::Completed,
    ];

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::Processing => "processing",
            JobStatus::Transcoding => "transcoding",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check whether `next` is a legal successor of `self`.
    ///
    /// Forward transitions move exactly one stage at a time; `Failed` is
    /// reachable from any non-terminal status. Everything else is a
    /// programming error and is rejected at the store boundary.
    pub fn can_advance_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Created, Processing) | (Processing, Transcoding) | (Transcoding, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Check if this is a terminal status (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(JobStatus::Created),
            "processing" => Ok(JobStatus::Processing),
            "transcoding" => Ok(JobStatus::Transcoding),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
