//! Wire types for the Encore API.
//!
//! Field names follow the service's camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Artifact type label of transcoded video files.
pub const VIDEO_FILE: &str = "VideoFile";
/// Artifact type label of transcoded audio files.
pub const AUDIO_FILE: &str = "AudioFile";

/// One input of a job submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoreInput {
    #[serde(rename = "type")]
    pub kind: String,
    pub uri: String,
    pub params: Map<String, Value>,
}

/// Payload for creating a job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoreJobRequest {
    pub external_id: String,
    pub profile: String,
    pub output_folder: String,
    pub base_name: String,
    pub priority: String,
    pub debug_overlay: String,
    pub log_context: Map<String, Value>,
    pub inputs: Vec<EncoreInput>,
}

impl EncoreJobRequest {
    /// Request with the defaults every pipeline submission shares: priority
    /// zero, no debug overlay, empty log context, a single input.
    pub fn new(
        external_id: impl Into<String>,
        profile: impl Into<String>,
        output_folder: &Path,
        base_name: impl Into<String>,
        input_kind: impl Into<String>,
        uri: &Path,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            profile: profile.into(),
            output_folder: output_folder.to_string_lossy().into_owned(),
            base_name: base_name.into(),
            priority: "0".to_string(),
            debug_overlay: "false".to_string(),
            log_context: Map::new(),
            inputs: vec![EncoreInput {
                kind: input_kind.into(),
                uri: uri.to_string_lossy().into_owned(),
                params: Map::new(),
            }],
        }
    }
}

/// Remote job status.
///
/// Only the two terminal values matter to the pipeline; every other value
/// the service may report counts as still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncoreJobStatus {
    Successful,
    Failed,
    #[default]
    #[serde(other)]
    InProgress,
}

impl EncoreJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EncoreJobStatus::Successful | EncoreJobStatus::Failed)
    }
}

/// One produced artifact in a job response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoreOutput {
    #[serde(rename = "type")]
    pub kind: String,
    pub file: String,
}

/// State of a remote job as reported by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoreJob {
    pub id: String,
    #[serde(default)]
    pub status: EncoreJobStatus,
    #[serde(default)]
    pub output: Vec<EncoreOutput>,
    #[serde(default)]
    pub started_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl EncoreJob {
    /// Wall-clock time the service spent on the job, when both stamps exist.
    pub fn processing_time(&self) -> Option<chrono::Duration> {
        Some(self.completed_date? - self.started_date?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = EncoreJobRequest::new(
            "v-0",
            "shot-change-video-only",
            Path::new("/enc/v-0"),
            "encore",
            "Video",
            Path::new("/tmp/only_video-0.mp4"),
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["externalId"], "v-0");
        assert_eq!(value["outputFolder"], "/enc/v-0");
        assert_eq!(value["baseName"], "encore");
        assert_eq!(value["debugOverlay"], "false");
        assert_eq!(value["inputs"][0]["type"], "Video");
        assert_eq!(value["inputs"][0]["uri"], "/tmp/only_video-0.mp4");
    }

    #[test]
    fn test_job_deserializes_terminal_response() {
        let body = r#"{
            "id": "e-42",
            "status": "SUCCESSFUL",
            "output": [
                {"type": "VideoFile", "file": "/enc/v-0/encore_x264.mp4"},
                {"type": "AudioFile", "file": "/enc/audio_STEREO.wav"}
            ],
            "startedDate": "2024-03-01T10:00:00Z",
            "completedDate": "2024-03-01T10:05:30Z"
        }"#;

        let job: EncoreJob = serde_json::from_str(body).unwrap();
        assert_eq!(job.status, EncoreJobStatus::Successful);
        assert_eq!(job.output.len(), 2);
        assert_eq!(
            job.processing_time().unwrap(),
            chrono::Duration::seconds(330)
        );
    }

    #[test]
    fn test_unknown_status_counts_as_running() {
        let body = r#"{"id": "e-1", "status": "QUEUED"}"#;
        let job: EncoreJob = serde_json::from_str(body).unwrap();
        assert_eq!(job.status, EncoreJobStatus::InProgress);
        assert!(!job.status.is_terminal());

        let body = r#"{"id": "e-1", "status": "IN_PROGRESS"}"#;
        let job: EncoreJob = serde_json::from_str(body).unwrap();
        assert_eq!(job.status, EncoreJobStatus::InProgress);
    }
}
