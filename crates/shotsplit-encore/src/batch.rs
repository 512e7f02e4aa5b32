//! Per-run submission batches and output extraction.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::client::EncoreClient;
use crate::error::EncoreResult;
use crate::types::{EncoreJob, EncoreJobRequest, VIDEO_FILE};

/// Encore profiles and artifact naming used for one pipeline run.
#[derive(Debug, Clone)]
pub struct BatchProfiles {
    /// Profile for the per-shot video-only jobs
    pub video_profile: String,
    /// Profile for the single audio job
    pub audio_profile: String,
    /// Base name the encoder gives video artifacts
    pub video_base_name: String,
    /// Base name the encoder gives audio artifacts
    pub audio_base_name: String,
}

impl Default for BatchProfiles {
    fn default() -> Self {
        Self {
            video_profile: "shot-change-video-only".to_string(),
            audio_profile: "audio-only".to_string(),
            video_base_name: "encore".to_string(),
            audio_base_name: "audio".to_string(),
        }
    }
}

/// Submit the single audio job of a pipeline run.
///
/// The output folder must already exist. Returns the remote job id.
pub async fn submit_audio(
    client: &EncoreClient,
    profiles: &BatchProfiles,
    job_id: &str,
    audio_path: &Path,
    output_dir: &Path,
) -> EncoreResult<String> {
    let request = EncoreJobRequest::new(
        format!("{job_id}-a"),
        &profiles.audio_profile,
        output_dir,
        &profiles.audio_base_name,
        "Audio",
        audio_path,
    );

    Ok(client.submit(&request).await?.id)
}

/// Submit one video-only job per shot, in shot order.
///
/// Shot `i` goes to `{shots_dir}/v-{i}` under external id `v-{i}`; those
/// folders must already exist. A failed submission retries that same shot
/// (inside `submit`) rather than dropping it from the batch.
pub async fn submit_shots(
    client: &EncoreClient,
    profiles: &BatchProfiles,
    shot_paths: &[PathBuf],
    shots_dir: &Path,
) -> EncoreResult<Vec<String>> {
    let mut ids = Vec::with_capacity(shot_paths.len());
    for (index, shot) in shot_paths.iter().enumerate() {
        let external_id = format!("v-{index}");
        let output_dir = shots_dir.join(&external_id);
        let request = EncoreJobRequest::new(
            &external_id,
            &profiles.video_profile,
            &output_dir,
            &profiles.video_base_name,
            "Video",
            shot,
        );
        ids.push(client.submit(&request).await?.id);
    }

    info!(shots = ids.len(), "shot batch submitted");
    Ok(ids)
}

/// Artifacts of `kind` in a response, in declared order.
///
/// A response without that kind simply contributes nothing; it is never an
/// error.
pub fn outputs_of(job: &EncoreJob, kind: &str) -> Vec<PathBuf> {
    job.output
        .iter()
        .filter(|output| output.kind == kind)
        .map(|output| PathBuf::from(&output.file))
        .collect()
}

/// Regroup shot-major responses into rendition-major part lists.
///
/// Responses arrive one per shot, each carrying that shot's video artifact
/// for every rendition in rendition order. The first response opens one
/// group per artifact; later responses append to the existing groups
/// positionally. The result feeds straight into concatenation: group order
/// is rendition order, part order within a group is shot order.
pub fn rendition_groups(jobs: &[EncoreJob]) -> Vec<Vec<PathBuf>> {
    let mut groups: Vec<Vec<PathBuf>> = Vec::new();

    for (index, job) in jobs.iter().enumerate() {
        let mut slot = 0;
        for output in &job.output {
            if output.kind != VIDEO_FILE {
                continue;
            }
            if index == 0 {
                groups.push(vec![PathBuf::from(&output.file)]);
            } else if let Some(group) = groups.get_mut(slot) {
                group.push(PathBuf::from(&output.file));
                slot += 1;
            }
        }
    }

    groups
}
