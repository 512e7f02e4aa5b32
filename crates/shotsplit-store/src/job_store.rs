//! The `jobs` table: creation, lookup, listings and status transitions.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use shotsplit_models::{Job, JobId, JobStatus, StatusTimestamps, UnknownStatus};

use crate::error::{StoreError, StoreResult};
use crate::vmaf::CREATE_VMAF_TABLE_SQL;

const CREATE_JOBS_TABLE_SQL: &str = "\
CREATE TABLE IF NOT EXISTS jobs (
    id               TEXT PRIMARY KEY,
    status           TEXT NOT NULL,
    shot_threshold   REAL NOT NULL,
    min_shot_length  REAL NOT NULL,
    source_location  TEXT NOT NULL,
    output_location  TEXT NOT NULL,
    time_created     TEXT,
    time_processing  TEXT,
    time_transcoding TEXT,
    time_completed   TEXT,
    time_failed      TEXT,
    failure_reason   TEXT
)";

/// Which jobs a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFilter {
    All,
    /// Everything not yet `Completed`; failed jobs stay visible here, where
    /// an operator will notice them
    Active,
    Completed,
}

/// Durable store for jobs and quality records.
#[derive(Debug, Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// Open the database at `url`, creating file and tables as needed.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Create the tables; runs on every startup, a no-op once they exist.
    async fn init(&self) -> StoreResult<()> {
        sqlx::query(CREATE_JOBS_TABLE_SQL).execute(&self.pool).await?;
        sqlx::query(CREATE_VMAF_TABLE_SQL).execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Persist a freshly created job, synchronously.
    ///
    /// Performs no parameter validation; that happened at the boundary.
    pub async fn create(&self, job: &Job) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO jobs \
             (id, status, shot_threshold, min_shot_length, source_location, output_location, time_created) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.id.to_string())
        .bind(job.status.as_str())
        .bind(job.shot_threshold)
        .bind(job.min_shot_length)
        .bind(job.source_location.to_string_lossy().into_owned())
        .bind(job.output_location.to_string_lossy().into_owned())
        .bind(job.timestamps.created)
        .execute(&self.pool)
        .await?;

        debug!(job_id = %job.id, "job persisted");
        Ok(())
    }

    /// Fetch a job snapshot.
    pub async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(job_from_row).transpose()
    }

    /// List job snapshots matching `filter`.
    pub async fn list(&self, filter: JobFilter) -> StoreResult<Vec<Job>> {
        let query = match filter {
            JobFilter::All => "SELECT * FROM jobs",
            JobFilter::Active => "SELECT * FROM jobs WHERE status != 'completed'",
            JobFilter::Completed => "SELECT * FROM jobs WHERE status = 'completed'",
        };

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        rows.into_iter().map(job_from_row).collect()
    }

    /// Move a job to `next` and stamp it, in one transaction.
    ///
    /// The transition table is enforced here: anything but the immediate
    /// successor (or `Failed` from a non-terminal status) comes back as
    /// `InvalidTransition` with the row untouched.
    pub async fn advance(&self, id: &JobId, next: JobStatus) -> StoreResult<Job> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_status(&mut tx, id).await?;
        if !current.can_advance_to(next) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        let update = format!(
            "UPDATE jobs SET status = ?, {} = ? WHERE id = ?",
            time_column(next)
        );
        sqlx::query(&update)
            .bind(next.as_str())
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(job_id = %id, status = %next, "job advanced");

        self.get(id).await?.ok_or(StoreError::JobNotFound(*id))
    }

    /// Record a fatal task outcome: `Failed` with cause and timestamp.
    ///
    /// A job already terminal is left alone.
    pub async fn mark_failed(&self, id: &JobId, reason: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_status(&mut tx, id).await?;
        if current.is_terminal() {
            return Ok(());
        }

        sqlx::query(
            "UPDATE jobs SET status = ?, time_failed = ?, failure_reason = ? WHERE id = ?",
        )
        .bind(JobStatus::Failed.as_str())
        .bind(Utc::now())
        .bind(reason)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(job_id = %id, reason, "job marked failed");
        Ok(())
    }
}

async fn fetch_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: &JobId,
) -> StoreResult<JobStatus> {
    let row = sqlx::query("SELECT status FROM jobs WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::JobNotFound(*id))?;

    parse_status(&row.try_get::<String, _>("status")?)
}

pub(crate) fn parse_status<S: FromStr<Err = UnknownStatus>>(value: &str) -> StoreResult<S> {
    value
        .parse()
        .map_err(|e: UnknownStatus| StoreError::Corrupt(e.to_string()))
}

fn time_column(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Created => "time_created",
        JobStatus::Processing => "time_processing",
        JobStatus::Transcoding => "time_transcoding",
        JobStatus::Completed => "time_completed",
        JobStatus::Failed => "time_failed",
    }
}

fn job_from_row(row: SqliteRow) -> StoreResult<Job> {
    let id = JobId::parse(&row.try_get::<String, _>("id")?)
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let status: JobStatus = parse_status(&row.try_get::<String, _>("status")?)?;

    let timestamps = StatusTimestamps {
        created: row.try_get("time_created")?,
        processing: row.try_get("time_processing")?,
        transcoding: row.try_get("time_transcoding")?,
        completed: row.try_get("time_completed")?,
        failed: row.try_get("time_failed")?,
    };

    Ok(Job {
        id,
        shot_threshold: row.try_get("shot_threshold")?,
        min_shot_length: row.try_get("min_shot_length")?,
        source_location: PathBuf::from(row.try_get::<String, _>("source_location")?),
        output_location: PathBuf::from(row.try_get::<String, _>("output_location")?),
        status,
        timestamps,
        failure_reason: row.try_get("failure_reason")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (JobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("jobs.db").display());
        let store = JobStore::connect(&url).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let (store, _dir) = test_store().await;
        let job = Job::new(0.3, 2.0, "/videos/in.mp4", "/outputs/");
        store.create(&job).await.unwrap();

        let loaded = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, job.id);
        assert_eq!(loaded.status, JobStatus::Created);
        assert_eq!(loaded.shot_threshold, 0.3);
        assert_eq!(loaded.source_location, PathBuf::from("/videos/in.mp4"));
        assert!(loaded.timestamps.created.is_some());
        assert!(loaded.timestamps.processing.is_none());
        assert!(loaded.timestamps.completed.is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_job_is_none() {
        let (store, _dir) = test_store().await;
        assert!(store.get(&JobId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_advance_walks_forward_with_ordered_timestamps() {
        let (store, _dir) = test_store().await;
        let job = Job::new(0.3, 2.0, "/videos/in.mp4", "/outputs/");
        store.create(&job).await.unwrap();

        store.advance(&job.id, JobStatus::Processing).await.unwrap();
        store.advance(&job.id, JobStatus::Transcoding).await.unwrap();
        let done = store.advance(&job.id, JobStatus::Completed).await.unwrap();

        assert_eq!(done.status, JobStatus::Completed);
        let ts = &done.timestamps;
        assert!(ts.created.unwrap() <= ts.processing.unwrap());
        assert!(ts.processing.unwrap() <= ts.transcoding.unwrap());
        assert!(ts.transcoding.unwrap() <= ts.completed.unwrap());
    }

    #[tokio::test]
    async fn test_advance_rejects_skipped_stage() {
        let (store, _dir) = test_store().await;
        let job = Job::new(0.3, 2.0, "/videos/in.mp4", "/outputs/");
        store.create(&job).await.unwrap();

        let err = store
            .advance(&job.id, JobStatus::Transcoding)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                from: JobStatus::Created,
                to: JobStatus::Transcoding,
            }
        ));

        // the row is untouched
        let loaded = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Created);
        assert!(loaded.timestamps.transcoding.is_none());
    }

    #[tokio::test]
    async fn test_advance_unknown_job() {
        let (store, _dir) = test_store().await;
        let err = store
            .advance(&JobId::new(), JobStatus::Processing)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn test_mark_failed_records_cause() {
        let (store, _dir) = test_store().await;
        let job = Job::new(0.3, 2.0, "/videos/in.mp4", "/outputs/");
        store.create(&job).await.unwrap();
        store.advance(&job.id, JobStatus::Processing).await.unwrap();

        store
            .mark_failed(&job.id, "trim video failed with exit code Some(1)")
            .await
            .unwrap();

        let loaded = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Failed);
        assert!(loaded.timestamps.failed.is_some());
        assert_eq!(
            loaded.failure_reason.as_deref(),
            Some("trim video failed with exit code Some(1)")
        );
    }

    #[tokio::test]
    async fn test_mark_failed_leaves_terminal_job_alone() {
        let (store, _dir) = test_store().await;
        let job = Job::new(0.3, 2.0, "/videos/in.mp4", "/outputs/");
        store.create(&job).await.unwrap();
        store.advance(&job.id, JobStatus::Processing).await.unwrap();
        store.advance(&job.id, JobStatus::Transcoding).await.unwrap();
        store.advance(&job.id, JobStatus::Completed).await.unwrap();

        store.mark_failed(&job.id, "late failure").await.unwrap();

        let loaded = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Completed);
        assert!(loaded.failure_reason.is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (store, _dir) = test_store().await;

        let finished = Job::new(0.3, 2.0, "/videos/a.mp4", "/outputs/");
        store.create(&finished).await.unwrap();
        store.advance(&finished.id, JobStatus::Processing).await.unwrap();
        store.advance(&finished.id, JobStatus::Transcoding).await.unwrap();
        store.advance(&finished.id, JobStatus::Completed).await.unwrap();

        let running = Job::new(0.2, 1.0, "/videos/b.mp4", "/outputs/");
        store.create(&running).await.unwrap();
        store.advance(&running.id, JobStatus::Processing).await.unwrap();
        store.advance(&running.id, JobStatus::Transcoding).await.unwrap();

        let all = store.list(JobFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);

        let active = store.list(JobFilter::Active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, running.id);

        let completed = store.list(JobFilter::Completed).await.unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, finished.id);
    }
}
