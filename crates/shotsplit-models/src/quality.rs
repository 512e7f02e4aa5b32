//! VMAF quality records.
//!
//! A quality record has its own lifecycle, independent of the job it scores:
//! it exists only once a computation has been requested, and unlike the job
//! it has always had an explicit failure status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::job::JobId;
use crate::job_status::UnknownStatus;

/// Status of a VMAF computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VmafStatus {
    /// Background task is running the comparison
    #[default]
    Computing,
    /// Score parsed and recorded
    Completed,
    /// Tool produced no parsable score
    Failed,
}

impl VmafStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VmafStatus::Computing => "computing",
            VmafStatus::Completed => "completed",
            VmafStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VmafStatus::Completed | VmafStatus::Failed)
    }
}

impl fmt::Display for VmafStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VmafStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "computing" => Ok(VmafStatus::Computing),
            "completed" => Ok(VmafStatus::Completed),
            "failed" => Ok(VmafStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// VMAF score of a job's primary output against its source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmafRecord {
    pub job_id: JobId,
    pub status: VmafStatus,
    /// Meaningful only when `status` is `Completed`
    pub score: f64,
}

impl VmafRecord {
    /// New record for a freshly accepted computation request.
    pub fn computing(job_id: JobId) -> Self {
        Self {
            job_id,
            status: VmafStatus::Computing,
            score: 0.0,
        }
    }
}
