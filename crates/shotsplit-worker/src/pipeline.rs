//! The per-job background pipeline.

use std::path::Path;
use tracing::info;

use shotsplit_encore::types::AUDIO_FILE;
use shotsplit_encore::{batch, EncoreClient};
use shotsplit_media::fs_utils::ensure_dir;
use shotsplit_media::{mux, segment, CommandRunner};
use shotsplit_models::{Job, JobStatus};
use shotsplit_store::JobStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Run every stage of one job, advancing the state machine at each boundary.
///
/// Executes inside the job's own task, the single writer for this job id.
/// Any error bubbles up to the supervisor, which records it on the job; the
/// caller that scheduled the job already got its answer and is never told
/// directly.
pub async fn run_pipeline(
    store: &JobStore,
    encore: &EncoreClient,
    runner: &dyn CommandRunner,
    config: &WorkerConfig,
    job: &Job,
) -> WorkerResult<()> {
    info!(
        job_id = %job.id,
        source = %job.source_location.display(),
        "pipeline started"
    );

    let job_dir = job.output_location.join(job.id.to_string());
    let temp_dir = job_dir.join("temp");
    let keep_dir = job_dir.join("keep");
    ensure_dir(&job_dir).await?;
    ensure_dir(&temp_dir).await?;
    ensure_dir(&keep_dir).await?;

    // working copies with audio and video split apart
    let only_audio = temp_dir.join("only_audio.wav");
    mux::copy_audio(runner, &job.source_location, &only_audio).await?;

    let container = source_container(&job.source_location)?;
    let only_video = temp_dir.join(format!("only_video.{container}"));
    mux::copy_video(runner, &job.source_location, &only_video).await?;

    let shots = segment::split_into_shots(
        runner,
        &only_video,
        &temp_dir,
        job.shot_threshold,
        job.min_shot_length,
    )
    .await?;
    store.advance(&job.id, JobStatus::Processing).await?;

    let audio_dir = temp_dir.join("encoded_audio");
    let shots_dir = temp_dir.join("encoded_shots");
    ensure_dir(&audio_dir).await?;
    ensure_dir(&shots_dir).await?;
    for index in 0..shots.len() {
        ensure_dir(&shots_dir.join(format!("v-{index}"))).await?;
    }

    let audio_id = batch::submit_audio(
        encore,
        &config.profiles,
        &job.id.to_string(),
        &only_audio,
        &audio_dir,
    )
    .await?;
    let video_ids = batch::submit_shots(encore, &config.profiles, &shots, &shots_dir).await?;

    let audio_jobs = encore.await_all(std::slice::from_ref(&audio_id)).await?;
    let audio_tracks = audio_jobs
        .first()
        .map(|response| batch::outputs_of(response, AUDIO_FILE))
        .unwrap_or_default();

    let video_jobs = encore.await_all(&video_ids).await?;
    let groups = batch::rendition_groups(&video_jobs);
    store.advance(&job.id, JobStatus::Transcoding).await?;

    let renditions = mux::concat_renditions(runner, &groups, &temp_dir).await?;
    let outputs = mux::remux_tracks(runner, &renditions, &audio_tracks, &keep_dir).await?;
    store.advance(&job.id, JobStatus::Completed).await?;

    info!(
        job_id = %job.id,
        renditions = renditions.len(),
        tracks = outputs.len(),
        "pipeline finished"
    );
    Ok(())
}

fn source_container(path: &Path) -> WorkerResult<&str> {
    path.extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| WorkerError::InvalidSource(path.display().to_string()))
}
