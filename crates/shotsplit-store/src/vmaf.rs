//! The `vmaf_scores` table: one quality record per job, at most.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use shotsplit_models::{JobId, VmafRecord, VmafStatus};

use crate::error::{StoreError, StoreResult};
use crate::job_store::{parse_status, JobStore};

pub(crate) const CREATE_VMAF_TABLE_SQL: &str = "\
CREATE TABLE IF NOT EXISTS vmaf_scores (
    job_id TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    score  REAL NOT NULL DEFAULT 0.0
)";

impl JobStore {
    /// Open a quality record in `Computing` for the job.
    ///
    /// A repeated request replaces the previous record, so a score can be
    /// recomputed after the keep directory changed.
    pub async fn start_quality(&self, id: &JobId) -> StoreResult<()> {
        sqlx::query("INSERT OR REPLACE INTO vmaf_scores (job_id, status, score) VALUES (?, ?, 0.0)")
            .bind(id.to_string())
            .bind(VmafStatus::Computing.as_str())
            .execute(self.pool())
            .await?;

        debug!(job_id = %id, "quality computation recorded");
        Ok(())
    }

    /// Terminal success: store the score.
    pub async fn complete_quality(&self, id: &JobId, score: f64) -> StoreResult<()> {
        sqlx::query("UPDATE vmaf_scores SET status = ?, score = ? WHERE job_id = ?")
            .bind(VmafStatus::Completed.as_str())
            .bind(score)
            .bind(id.to_string())
            .execute(self.pool())
            .await?;

        debug!(job_id = %id, score, "quality computation completed");
        Ok(())
    }

    /// Terminal failure: the tool produced no parsable score.
    pub async fn fail_quality(&self, id: &JobId) -> StoreResult<()> {
        sqlx::query("UPDATE vmaf_scores SET status = ? WHERE job_id = ?")
            .bind(VmafStatus::Failed.as_str())
            .bind(id.to_string())
            .execute(self.pool())
            .await?;

        debug!(job_id = %id, "quality computation failed");
        Ok(())
    }

    /// Fetch the quality record; `None` means never requested.
    pub async fn get_quality(&self, id: &JobId) -> StoreResult<Option<VmafRecord>> {
        let row = sqlx::query("SELECT * FROM vmaf_scores WHERE job_id = ?")
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;

        row.map(record_from_row).transpose()
    }
}

fn record_from_row(row: SqliteRow) -> StoreResult<VmafRecord> {
    let job_id = JobId::parse(&row.try_get::<String, _>("job_id")?)
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let status: VmafStatus = parse_status(&row.try_get::<String, _>("status")?)?;

    Ok(VmafRecord {
        job_id,
        status,
        score: row.try_get("score")?,
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
    async fn test_quality_never_requested_is_none() {
        let (store, _dir) = test_store().await;
        assert!(store.get_quality(&JobId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quality_lifecycle_completed() {
        let (store, _dir) = test_store().await;
        let id = JobId::new();

        store.start_quality(&id).await.unwrap();
        let record = store.get_quality(&id).await.unwrap().unwrap();
        assert_eq!(record.status, VmafStatus::Computing);
        assert_eq!(record.score, 0.0);

        store.complete_quality(&id, 93.123456).await.unwrap();
        let record = store.get_quality(&id).await.unwrap().unwrap();
        assert_eq!(record.status, VmafStatus::Completed);
        assert!((record.score - 93.123456).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_quality_lifecycle_failed() {
        let (store, _dir) = test_store().await;
        let id = JobId::new();

        store.start_quality(&id).await.unwrap();
        store.fail_quality(&id).await.unwrap();

        let record = store.get_quality(&id).await.unwrap().unwrap();
        assert_eq!(record.status, VmafStatus::Failed);
    }

    #[tokio::test]
    async fn test_quality_can_be_rerequested() {
        let (store, _dir) = test_store().await;
        let id = JobId::new();

        store.start_quality(&id).await.unwrap();
        store.complete_quality(&id, 80.0).await.unwrap();

        // a new request resets the record to computing
        store.start_quality(&id).await.unwrap();
        let record = store.get_quality(&id).await.unwrap().unwrap();
        assert_eq!(record.status, VmafStatus::Computing);
        assert_eq!(record.score, 0.0);
    }
}
