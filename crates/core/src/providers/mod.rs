pub mod benchmark;
pub mod stock;
pub mod userprofile;

use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;
const MAX_RETRIES: u32 = 10;
const MAX_BACKOFF_SECS: u64 = 60;

/// Non-2xx answer from an upstream service.
#[derive(Debug, thiserror::Error)]
#[error("{service} HTTP {status}: {body}")]
pub struct UpstreamStatusError {
    pub service: &'static str,
    pub status: u16,
    pub body: String,
}

impl UpstreamStatusError {
    fn is_retryable(&self) -> bool {
        self.status >= 500 || self.status == 429
    }
}

/// Shared HTTP settings for one upstream, read from `<PREFIX>_TIMEOUT_SECS` and
/// `<PREFIX>_RETRIES`.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl HttpOptions {
    pub fn from_env(prefix: &str) -> Self {
        let timeout_secs = std::env::var(format!("{prefix}_TIMEOUT_SECS"))
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var(format!("{prefix}_RETRIES"))
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n >= 1)
            .map(|n| n.min(MAX_RETRIES))
            .unwrap_or(DEFAULT_RETRIES);

        Self {
            timeout: Duration::from_secs(timeout_secs),
            retries,
        }
    }

    pub(crate) fn build_client(&self, service: &str) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .with_context(|| format!("failed to build {service} http client"))
    }
}

pub(crate) fn join_url(base_url: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}

/// Reads the body, turning non-2xx statuses into [`UpstreamStatusError`].
pub(crate) async fn success_body(res: reqwest::Response, service: &'static str) -> Result<String> {
    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("failed to read {service} response"))?;

    if !status.is_success() {
        return Err(UpstreamStatusError {
            service,
            status: status.as_u16(),
            body,
        }
        .into());
    }

    Ok(body)
}

/// Runs `op` up to `retries` times with exponential backoff. Client errors
/// (4xx other than 429) are returned immediately.
pub(crate) async fn with_retries<T, F, Fut>(service: &'static str, retries: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(err) => {
                let retryable = err
                    .downcast_ref::<UpstreamStatusError>()
                    .map_or(true, UpstreamStatusError::is_retryable);
                if !retryable || attempt >= retries {
                    return Err(err);
                }
                let backoff = backoff_after(attempt);
                tracing::warn!(service, attempt, ?backoff, error = %err, "upstream request failed; retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// 1s, 2s, 4s, ... capped at a minute.
fn backoff_after(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(6);
    Duration::from_secs((1u64 << shift).min(MAX_BACKOFF_SECS))
}
