//! Job entity, identifiers and the schedule request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::job_status::JobStatus;

/// Unique identifier for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

/// Raised when a client-supplied identifier is not a well-formed UUID.
#[derive(Debug, Error)]
#[error("not a valid job id: {0}")]
pub struct InvalidJobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a client-supplied identifier.
    ///
    /// Anything that is not a well-formed UUID is rejected here, before any
    /// store lookup happens.
    pub fn parse(s: &str) -> Result<Self, InvalidJobId> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| InvalidJobId(s.to_string()))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-status timestamps for a job.
///
/// Every slot exists from creation and stays `None` until its status is
/// reached, so time deltas over unreached statuses come back as unavailable
/// instead of arithmetic on a sentinel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusTimestamps {
    pub created: Option<DateTime<Utc>>,
    pub processing: Option<DateTime<Utc>>,
    pub transcoding: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
    pub failed: Option<DateTime<Utc>>,
}

impl StatusTimestamps {
    /// Timestamp recorded for `status`, if that status has been reached.
    pub fn get(&self, status: JobStatus) -> Option<DateTime<Utc>> {
        match status {
            JobStatus::Created => self.created,
            JobStatus::Processing => self.processing,
            JobStatus::Transcoding => self.transcoding,
            JobStatus::Completed => self.completed,
            JobStatus::Failed => self.failed,
        }
    }

    /// Record the timestamp for `status`.
    pub fn set(&mut self, status: JobStatus, at: DateTime<Utc>) {
        let slot = match status {
            JobStatus::Created => &mut self.created,
            JobStatus::Processing => &mut self.processing,
            JobStatus::Transcoding => &mut self.transcoding,
            JobStatus::Completed => &mut self.completed,
            JobStatus::Failed => &mut self.failed,
        };
        *slot = Some(at);
    }

    /// Time spent between two reached statuses.
    ///
    /// `None` when either endpoint has not been reached yet.
    pub fn elapsed_between(&self, from: JobStatus, to: JobStatus) -> Option<Duration> {
        Some(self.get(to)? - self.get(from)?)
    }
}

/// One submitted source video and its pipeline state.
///
/// Mutated only by the single background task owning this job id; everyone
/// else sees read-only snapshots out of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Scene-change sensitivity in [0, 1], higher is less sensitive
    pub shot_threshold: f64,
    /// Shots shorter than this many seconds are merged into a neighbor
    pub min_shot_length: f64,
    pub source_location: PathBuf,
    pub output_location: PathBuf,
    pub status: JobStatus,
    pub timestamps: StatusTimestamps,
    /// Set only when `status` is `Failed`
    pub failure_reason: Option<String>,
}

impl Job {
    /// Create a new job in `Created` with the creation slot stamped.
    pub fn new(
        shot_threshold: f64,
        min_shot_length: f64,
        source_location: impl Into<PathBuf>,
        output_location: impl Into<PathBuf>,
    ) -> Self {
        let mut timestamps = StatusTimestamps::default();
        timestamps.set(JobStatus::Created, Utc::now());

        Self {
            id: JobId::new(),
            shot_threshold,
            min_shot_length,
            source_location: source_location.into(),
            output_location: output_location.into(),
            status: JobStatus::Created,
            timestamps,
            failure_reason: None,
        }
    }

    /// Build a job from an already validated schedule request.
    pub fn from_request(request: &ScheduleRequest) -> Self {
        Self::new(
            request.shot_threshold,
            request.min_shot_length,
            &request.source_location,
            &request.output_location,
        )
    }

    /// Check if the job is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Parameters accepted when scheduling a job.
///
/// This is the shape the API shell hands over; the ranges match what the
/// scene-change filter and the merge pass accept.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScheduleRequest {
    #[validate(range(min = 0.0, max = 1.0))]
    pub shot_threshold: f64,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub min_shot_length: f64,
    #[validate(length(min = 1))]
    pub source_location: String,
    #[validate(length(min = 1))]
    pub output_location: String,
}
