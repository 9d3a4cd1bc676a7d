//! HTTP retry policy with exponential backoff.
//!
//! # Retryable Conditions
//!
//! - HTTP 408, 409, 5xx
//! - HTTP 429 only when the server announces a `Retry-After`; without it the
//!   quota is treated as exhausted
//! - Connection errors and timeouts
//! - `x-should-retry: true` forces retry, `x-should-retry: false` forbids it
//!
//! Authentication failures and other 4xx responses are never retried.

use crate::config::RetrySettings;
use reqwest::{header::HeaderMap, RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// Header carrying the zero-based attempt number.
const RETRY_COUNT_HEADER: &str = "X-Retry-Count";

/// Retry policy derived from [`RetrySettings`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Initial backoff delay before first retry.
    pub initial_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: settings.initial_delay(),
            max_delay: settings.max_delay(),
            jitter_factor: settings.jitter_factor.clamp(0.0, 1.0),
        }
    }
}

/// Parse `Retry-After-Ms` or `Retry-After` headers.
///
/// Returns `Some(duration)` if a valid value is found and `0 < duration < 60s`.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let in_range = |d: Duration| d > Duration::ZERO && d < Duration::from_secs(60);

    let from_ms = headers
        .get("retry-after-ms")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|ms| ms.is_finite())
        .and_then(|ms| Duration::try_from_secs_f64(ms.max(0.0) / 1000.0).ok())
        .filter(|d| in_range(*d));
    if from_ms.is_some() {
        return from_ms;
    }

    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .filter(|d| in_range(*d))
}

/// Determine if a response status is retryable.
pub fn should_retry(status: StatusCode, headers: &HeaderMap) -> bool {
    let forced = headers
        .get("x-should-retry")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_ascii_lowercase());
    match forced.as_deref() {
        Some("true") => return true,
        Some("false") => return false,
        _ => {}
    }

    match status.as_u16() {
        408 | 409 | 500..=599 => true,
        429 => parse_retry_after(headers).is_some(),
        _ => false,
    }
}

/// Calculate retry delay with exponential backoff and down-jitter.
///
/// `backoff_step` is 0 before the first retry, 1 before the second, etc.
pub fn calculate_retry_delay(
    backoff_step: u32,
    policy: &RetryPolicy,
    headers: Option<&HeaderMap>,
) -> Duration {
    if let Some(delay) = headers.and_then(parse_retry_after) {
        return delay;
    }

    let base = policy.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step as i32);
    let capped = base.min(policy.max_delay.as_secs_f64());
    let jitter = 1.0 - rand::random::<f64>() * policy.jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}

/// Outcome of a retried request.
#[derive(Debug)]
pub enum RetryOutcome {
    /// 2xx response.
    Success(Response),
    /// Non-2xx response, either non-retryable or after exhausting retries.
    HttpError(Response),
    /// Transport failure after exhausting retries.
    ConnectionError {
        attempts: u32,
        source: reqwest::Error,
    },
    /// Transport failure that cannot be retried.
    NonRetryable(reqwest::Error),
}

/// Send a request, retrying transient failures.
///
/// `build_request` is called once per attempt.
pub async fn send_with_retry<F>(build_request: F, policy: &RetryPolicy) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    let last = policy.max_attempts.max(1) - 1;
    let mut attempt = 0;

    loop {
        let request = build_request().header(RETRY_COUNT_HEADER, attempt.to_string());

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return RetryOutcome::Success(response);
                }
                if attempt < last && should_retry(status, response.headers()) {
                    let delay = calculate_retry_delay(attempt, policy, Some(response.headers()));
                    tracing::debug!(
                        status = %status,
                        retry_count = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying request after error status"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return RetryOutcome::HttpError(response);
            }
            Err(e) => {
                if !is_retryable_error(&e) {
                    return RetryOutcome::NonRetryable(e);
                }
                if attempt == last {
                    return RetryOutcome::ConnectionError {
                        attempts: attempt + 1,
                        source: e,
                    };
                }
                let delay = calculate_retry_delay(attempt, policy, None);
                tracing::debug!(
                    error = %e,
                    retry_count = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request after connection error"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
