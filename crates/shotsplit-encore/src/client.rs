//! HTTP client with retry and poll loops.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{EncoreError, EncoreResult};
use crate::types::{EncoreJob, EncoreJobRequest, EncoreJobStatus};

/// Fixed-delay retry policy for submissions and poll rounds.
///
/// The service is treated as eventually consistent: by default there is no
/// attempt ceiling, a transient failure waits out the delay and tries again
/// forever. Configure `max_attempts` to bound that instead of stalling a job
/// indefinitely on a dead service.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Pause between attempts, and between poll rounds
    pub delay: Duration,
    /// Attempt ceiling; `None` retries indefinitely
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct EncoreConfig {
    /// Base URL of the Encore service
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for EncoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl EncoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ENCORE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            timeout: Duration::from_secs(
                std::env::var("ENCORE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            retry: RetryPolicy {
                delay: Duration::from_secs(
                    std::env::var("ENCORE_RETRY_DELAY_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(3),
                ),
                max_attempts: std::env::var("ENCORE_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok()),
            },
        }
    }
}

/// Client for the Encore service.
pub struct EncoreClient {
    http: Client,
    config: EncoreConfig,
}

impl EncoreClient {
    /// Create a new client.
    pub fn new(config: EncoreConfig) -> EncoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(EncoreError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> EncoreResult<Self> {
        Self::new(EncoreConfig::from_env())
    }

    pub fn config(&self) -> &EncoreConfig {
        &self.config
    }

    /// Create a job; the service answers 201 Created on success.
    pub async fn create_job(&self, request: &EncoreJobRequest) -> EncoreResult<EncoreJob> {
        let url = format!("{}/encoreJobs", self.config.base_url);
        let response = self.http.post(&url).json(request).send().await?;

        if response.status() != StatusCode::CREATED {
            return Err(EncoreError::UnexpectedStatus {
                operation: "create job",
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch a job's current state.
    pub async fn get_job(&self, id: &str) -> EncoreResult<EncoreJob> {
        let url = format!("{}/encoreJobs/{}", self.config.base_url, id);
        let response = self.http.get(&url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(EncoreError::UnexpectedStatus {
                operation: "get job",
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }

    /// Submit a job, retrying transient failures at the fixed delay.
    ///
    /// With no ceiling configured this never gives up on its own; the job it
    /// belongs to stalls rather than fails while the service is unreachable.
    pub async fn submit(&self, request: &EncoreJobRequest) -> EncoreResult<EncoreJob> {
        let mut attempts = 0u32;
        loop {
            match self.create_job(request).await {
                Ok(job) => {
                    debug!(
                        remote_id = %job.id,
                        external_id = %request.external_id,
                        "job submitted"
                    );
                    return Ok(job);
                }
                Err(e) if e.is_transient() => {
                    attempts += 1;
                    if self.config.retry.exhausted(attempts) {
                        return Err(EncoreError::RetriesExhausted {
                            operation: "submit",
                            attempts,
                        });
                    }
                    warn!(
                        external_id = %request.external_id,
                        attempts,
                        "submission failed, retrying: {e}"
                    );
                    tokio::time::sleep(self.config.retry.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Poll every id until the whole batch is terminal-successful.
    ///
    /// Rounds run at the fixed delay and walk the ids in order. A `FAILED`
    /// job aborts immediately with the remote message; ids after it in the
    /// round are never polled. A transient failure anywhere restarts the
    /// whole round from the first id, re-polling jobs that already
    /// succeeded; completed work is re-checked rather than cached across
    /// rounds, so a response is only trusted in the round that returns it.
    /// The configured ceiling bounds consecutive failed rounds.
    pub async fn await_all(&self, ids: &[String]) -> EncoreResult<Vec<EncoreJob>> {
        let mut failed_rounds = 0u32;
        loop {
            tokio::time::sleep(self.config.retry.delay).await;

            let mut finished = Vec::with_capacity(ids.len());
            let mut round_ok = true;

            for id in ids {
                match self.get_job(id).await {
                    Ok(job) => match job.status {
                        EncoreJobStatus::Successful => finished.push(job),
                        EncoreJobStatus::Failed => {
                            return Err(EncoreError::RemoteJobFailed {
                                id: id.clone(),
                                message: job.message.unwrap_or_default(),
                            });
                        }
                        EncoreJobStatus::InProgress => {}
                    },
                    Err(e) if e.is_transient() => {
                        failed_rounds += 1;
                        if self.config.retry.exhausted(failed_rounds) {
                            return Err(EncoreError::RetriesExhausted {
                                operation: "poll",
                                attempts: failed_rounds,
                            });
                        }
                        warn!(%id, "poll failed, restarting round: {e}");
                        round_ok = false;
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }

            if round_ok {
                failed_rounds = 0;
                if finished.len() == ids.len() {
                    return Ok(finished);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EncoreJobRequest;
    use serde_json::json;
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> EncoreConfig {
        EncoreConfig {
            base_url,
            timeout: Duration::from_secs(5),
            retry: RetryPolicy {
                delay: Duration::from_millis(10),
                max_attempts: Some(20),
            },
        }
    }

    fn video_request() -> EncoreJobRequest {
        EncoreJobRequest::new(
            "v-0",
            "shot-change-video-only",
            Path::new("/enc/v-0"),
            "encore",
            "Video",
            Path::new("/tmp/only_video-0.mp4"),
        )
    }

    #[tokio::test]
    async fn test_submit_retries_transient_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/encoreJobs"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/encoreJobs"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "e-1", "status": "QUEUED"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = EncoreClient::new(test_config(server.uri())).unwrap();
        let job = client.submit(&video_request()).await.unwrap();
        assert_eq!(job.id, "e-1");
    }

    #[tokio::test]
    async fn test_submit_respects_attempt_ceiling() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/encoreJobs"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut config = test_config(server.uri());
        config.retry.max_attempts = Some(3);

        let client = EncoreClient::new(config).unwrap();
        let err = client.submit(&video_request()).await.unwrap_err();
        assert!(matches!(
            err,
            EncoreError::RetriesExhausted { attempts: 3, .. }
        ));
    }

    #[tokio::test]
    async fn test_await_all_returns_when_batch_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/encoreJobs/e-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "e-1", "status": "SUCCESSFUL"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/encoreJobs/e-2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "e-2", "status": "SUCCESSFUL"})),
            )
            .mount(&server)
            .await;

        let client = EncoreClient::new(test_config(server.uri())).unwrap();
        let jobs = client
            .await_all(&["e-1".to_string(), "e-2".to_string()])
            .await
            .unwrap();
        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn test_await_all_aborts_on_failed_job_without_polling_siblings() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/encoreJobs/e-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"id": "e-1", "status": "FAILED", "message": "profile rejected"}),
            ))
            .mount(&server)
            .await;
        // the sibling must never be polled
        Mock::given(method("GET"))
            .and(path("/encoreJobs/e-2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "e-2", "status": "SUCCESSFUL"})),
            )
            .expect(0)
            .mount(&server)
            .await;

        let client = EncoreClient::new(test_config(server.uri())).unwrap();
        let err = client
            .await_all(&["e-1".to_string(), "e-2".to_string()])
            .await
            .unwrap_err();

        match err {
            EncoreError::RemoteJobFailed { id, message } => {
                assert_eq!(id, "e-1");
                assert_eq!(message, "profile rejected");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_await_all_restarts_round_from_first_id_on_transport_error() {
        let server = MockServer::start().await;

        // already-successful job gets re-polled after the sibling's hiccup
        Mock::given(method("GET"))
            .and(path("/encoreJobs/e-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "e-1", "status": "SUCCESSFUL"})),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/encoreJobs/e-2"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/encoreJobs/e-2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "e-2", "status": "SUCCESSFUL"})),
            )
            .mount(&server)
            .await;

        let client = EncoreClient::new(test_config(server.uri())).unwrap();
        let jobs = client
            .await_all(&["e-1".to_string(), "e-2".to_string()])
            .await
            .unwrap();
        assert_eq!(jobs.len(), 2);
    }
}
