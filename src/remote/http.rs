//! HTTP implementation of [`AnalysisClient`].
//!
//! The service works on jobs: the abstracted files are submitted to
//! `POST {api}/api/process_code`, which answers with a job id, and the
//! result is collected by polling `GET {api}/api/status/{job_id}` until the
//! job reports `completed` or `failed`.

use super::client::{AnalysisClient, AnalysisRequest, AnalysisResponse};
use super::retry::{send_with_retry, RetryOutcome, RetryPolicy};
use crate::config::{ProviderConfig, RetrySettings};
use crate::error::{AbstractionError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Header carrying the action token.
const ACTION_TOKEN_HEADER: &str = "X-0Pirate-Action-Token";

/// Job submission endpoint, relative to the API base.
const SUBMIT_PATH: &str = "api/process_code";

/// Job status endpoint prefix, relative to the API base.
const STATUS_PATH: &str = "api/status/";

#[derive(Debug, Deserialize)]
struct JobSubmission {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: String,
    #[serde(default)]
    notice: Option<String>,
    #[serde(flatten)]
    response: AnalysisResponse,
}

/// Analysis client talking to the remote job API.
pub struct HttpAnalysisClient {
    /// HTTP client for API calls
    client: Client,
    /// API base, always ending in `/`
    base_url: Url,
    /// Opaque action token
    action_token: Option<String>,
    /// Retry policy for individual calls
    retry: RetryPolicy,
    /// Delay before each status poll
    poll_interval: Duration,
    /// Status polls before giving up
    max_polls: u32,
}

impl HttpAnalysisClient {
    /// Create a client from provider and retry settings.
    pub fn new(provider: &ProviderConfig, retry: &RetrySettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(provider.timeout_secs))
            .build()?;

        let mut base_url = Url::parse(&provider.api_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            action_token: provider.action_token.clone(),
            retry: RetryPolicy::from(retry),
            poll_interval: Duration::from_millis(provider.poll_interval_ms),
            max_polls: provider.max_polls,
        })
    }

    /// Submit the request and return the job id.
    async fn submit(&self, request: &AnalysisRequest) -> Result<String> {
        let url = self.base_url.join(SUBMIT_PATH)?;
        debug!(
            "Submitting {} abstracted files for session {}",
            request.files.len(),
            request.session_id
        );

        let outcome = send_with_retry(
            || {
                self.client
                    .post(url.clone())
                    .header(ACTION_TOKEN_HEADER, self.token())
                    .json(request)
            },
            &self.retry,
        )
        .await;

        let submission: JobSubmission = parse_body(into_response(outcome).await?).await?;
        info!("Remote job {} accepted", submission.job_id);
        Ok(submission.job_id)
    }

    /// Poll the job until it finishes.
    async fn poll(&self, job_id: &str) -> Result<AnalysisResponse> {
        let url = self.base_url.join(STATUS_PATH)?.join(job_id)?;

        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let outcome = send_with_retry(
                || {
                    self.client
                        .get(url.clone())
                        .header(ACTION_TOKEN_HEADER, self.token())
                },
                &self.retry,
            )
            .await;
            let status: JobStatus = parse_body(into_response(outcome).await?).await?;

            match status.status.as_str() {
                "completed" => {
                    info!("Remote job {} completed after {} polls", job_id, attempt);
                    return Ok(status.response);
                }
                "failed" => {
                    let notice = status
                        .notice
                        .unwrap_or_else(|| "no reason given".to_string());
                    warn!("Remote job {} failed: {}", job_id, notice);
                    return Err(AbstractionError::RemoteProtocol(format!(
                        "job {} failed: {}",
                        job_id, notice
                    )));
                }
                other => debug!(
                    "Remote job {} is {} ({}/{})",
                    job_id, other, attempt, self.max_polls
                ),
            }
        }

        Err(AbstractionError::Timeout(
            (self.poll_interval * self.max_polls).as_secs(),
        ))
    }

    fn token(&self) -> &str {
        self.action_token.as_deref().unwrap_or_default()
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let job_id = self.submit(request).await?;
        self.poll(&job_id).await
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Map a retry outcome to a successful response or a terminal error.
async fn into_response(outcome: RetryOutcome) -> Result<Response> {
    match outcome {
        RetryOutcome::Success(response) => Ok(response),
        RetryOutcome::HttpError(response) => Err(status_error(response).await),
        RetryOutcome::ConnectionError { attempts, source } => Err(
            AbstractionError::RemoteTransport(format!("{} (after {} attempts)", source, attempts)),
        ),
        RetryOutcome::NonRetryable(e) => Err(AbstractionError::Http(e)),
    }
}

async fn status_error(response: Response) -> AbstractionError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AbstractionError::AuthRejected(status.as_u16())
        }
        StatusCode::TOO_MANY_REQUESTS => AbstractionError::QuotaExceeded(body),
        s if s.is_server_error() => {
            AbstractionError::RemoteTransport(format!("server error {} persisted", s))
        }
        s => AbstractionError::RemoteProtocol(format!("unexpected status {}: {}", s, body)),
    }
}

async fn parse_body<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AbstractionError::RemoteProtocol(format!("malformed response body: {}", e)))
}
