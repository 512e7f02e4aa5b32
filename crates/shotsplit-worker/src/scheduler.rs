//! The scheduler facade the API shell calls into.

use std::path::Path;
use std::sync::Arc;
use tracing::error;
use validator::Validate;

use shotsplit_encore::EncoreClient;
use shotsplit_media::probe::{self, StreamInfo};
use shotsplit_media::{CommandRunner, ProcessRunner};
use shotsplit_models::{Job, JobId, ScheduleRequest, VmafRecord};
use shotsplit_store::{JobFilter, JobStore};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::{pipeline, quality};

/// Front door for the scheduling primitives.
///
/// Owns the store, the Encore client and the command runner. Every accepted
/// job and every accepted quality request becomes one fire-and-forget
/// background task; the accepting call returns as soon as the record is
/// durable. Tasks never talk to each other, the store is the only thing
/// they share.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    store: JobStore,
    encore: EncoreClient,
    runner: Arc<dyn CommandRunner>,
    config: WorkerConfig,
}

impl Scheduler {
    /// Create a scheduler over an open store.
    pub fn new(
        store: JobStore,
        encore: EncoreClient,
        runner: Arc<dyn CommandRunner>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                encore,
                runner,
                config,
            }),
        }
    }

    /// Scheduler with the real subprocess runner.
    pub fn with_process_runner(store: JobStore, encore: EncoreClient, config: WorkerConfig) -> Self {
        Self::new(store, encore, Arc::new(ProcessRunner), config)
    }

    /// The underlying store, for embedding callers.
    pub fn store(&self) -> &JobStore {
        &self.inner.store
    }

    /// Validate and persist a new job, then kick off its pipeline task.
    ///
    /// Returns as soon as the job is durable; later progress is only
    /// observable through `get_job`. A task that dies is recorded as
    /// `Failed` with its cause on the job itself.
    pub async fn schedule_job(&self, request: &ScheduleRequest) -> WorkerResult<JobId> {
        request.validate()?;
        self.ensure_video_source(Path::new(&request.source_location))
            .await?;

        let job = Job::from_request(request);
        self.inner.store.create(&job).await?;

        let inner = Arc::clone(&self.inner);
        let task_job = job.clone();
        tokio::spawn(async move {
            let result = pipeline::run_pipeline(
                &inner.store,
                &inner.encore,
                inner.runner.as_ref(),
                &inner.config,
                &task_job,
            )
            .await;

            if let Err(e) = result {
                error!(job_id = %task_job.id, "pipeline task died: {e}");
                if let Err(store_err) =
                    inner.store.mark_failed(&task_job.id, &e.to_string()).await
                {
                    error!(job_id = %task_job.id, "could not record job failure: {store_err}");
                }
            }
        });

        Ok(job.id)
    }

    /// Snapshot of one job; the id is validated before the store is touched.
    pub async fn get_job(&self, id: &str) -> WorkerResult<Job> {
        let id = JobId::parse(id)?;
        self.inner
            .store
            .get(&id)
            .await?
            .ok_or(WorkerError::JobNotFound(id))
    }

    /// Job snapshots matching `filter`.
    pub async fn list_jobs(&self, filter: JobFilter) -> WorkerResult<Vec<Job>> {
        Ok(self.inner.store.list(filter).await?)
    }

    /// Stream report of a job's source file.
    pub async fn video_info(&self, id: &str) -> WorkerResult<Vec<StreamInfo>> {
        let job = self.get_job(id).await?;
        Ok(probe::probe_streams(self.inner.runner.as_ref(), &job.source_location).await?)
    }

    /// Accept a quality-computation request and return immediately.
    ///
    /// The job must exist. The record shows up in `Computing` once the task
    /// has opened it; a task that dies before scoring is recorded as a
    /// failed computation.
    pub async fn request_quality(&self, id: &str) -> WorkerResult<()> {
        let job = self.get_job(id).await?;

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = quality::run_quality(
                &inner.store,
                inner.runner.as_ref(),
                &inner.config,
                &job,
            )
            .await;

            if let Err(e) = result {
                error!(job_id = %job.id, "quality task died: {e}");
                if let Err(store_err) = inner.store.fail_quality(&job.id).await {
                    error!(job_id = %job.id, "could not record quality failure: {store_err}");
                }
            }
        });

        Ok(())
    }

    /// Quality snapshot; `None` means not yet computed.
    pub async fn get_quality(&self, id: &str) -> WorkerResult<Option<VmafRecord>> {
        let id = JobId::parse(id)?;
        Ok(self.inner.store.get_quality(&id).await?)
    }

    /// Reject a source that does not exist, or that the media tool cannot
    /// read as anything with streams.
    async fn ensure_video_source(&self, path: &Path) -> WorkerResult<()> {
        if !path.is_file() {
            return Err(WorkerError::InvalidSource(path.display().to_string()));
        }

        let streams = probe::probe_streams(self.inner.runner.as_ref(), path).await?;
        if streams.is_empty() {
            return Err(WorkerError::InvalidSource(path.display().to_string()));
        }

        Ok(())
    }
}
