//! The VMAF quality background task.

use tracing::{info, warn};

use shotsplit_media::{vmaf, CommandRunner};
use shotsplit_models::Job;
use shotsplit_store::JobStore;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Compute the VMAF score of the job's primary keep output.
///
/// Opens the quality record, runs the comparison and records the terminal
/// status. The processed file is the keep-directory output named in the
/// config; the reference is the job's original source.
pub async fn run_quality(
    store: &JobStore,
    runner: &dyn CommandRunner,
    config: &WorkerConfig,
    job: &Job,
) -> WorkerResult<()> {
    store.start_quality(&job.id).await?;

    let processed = job
        .output_location
        .join(job.id.to_string())
        .join("keep")
        .join(&config.quality_target);

    let score = vmaf::compute_score(runner, &processed, &job.source_location, &config.vmaf).await?;

    match score {
        Some(score) => {
            store.complete_quality(&job.id, score).await?;
            info!(job_id = %job.id, score, "quality computed");
        }
        None => {
            store.fail_quality(&job.id).await?;
            warn!(job_id = %job.id, "quality run produced no parsable score");
        }
    }

    Ok(())
}
