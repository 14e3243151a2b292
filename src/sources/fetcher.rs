//! Upstream page fetcher
//!
//! Issues GET requests against the ratings site, classifies each outcome and
//! owns the retry loop. Only transient failures (timeouts, connection errors,
//! HTTP 5xx/429/408) are retried; 404 and other client errors are terminal.
//! Any 2xx body is returned as is: deciding whether a page means "no such
//! player" needs the parsed document.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument, warn};

use crate::config::ScraperConfig;
use crate::errors::{FetchError, FetchResult, TransportError};
use crate::utils::{HttpTransport, RawResponse, RetryConfig, SessionManager, UrlUtils};

/// Result of a single attempt after classification
#[derive(Debug)]
enum AttemptOutcome {
    Success(RawResponse),
    Terminal(FetchError),
    Transient(String),
}

/// Reachability of the upstream site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum UpstreamStatus {
    Online { latency_ms: u64 },
    Degraded { status: u16, latency_ms: u64 },
    Offline { reason: String },
}

impl UpstreamStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online { .. })
    }
}

pub struct Fetcher<T: HttpTransport = SessionManager> {
    transport: Arc<T>,
    base_url: String,
    retry: RetryConfig,
}

impl<T: HttpTransport> Fetcher<T> {
    pub fn new(transport: Arc<T>, config: &ScraperConfig) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            retry: RetryConfig::from(config),
        }
    }

    /// Override the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Absolute URL for a path relative to the configured site
    pub fn url_for(&self, path: &str) -> FetchResult<String> {
        UrlUtils::join(&self.base_url, path).map_err(|e| FetchError::Unavailable {
            attempts: 0,
            message: format!("invalid request URL for '{path}': {e}"),
        })
    }

    /// Fetch a page, retrying transient failures with exponential backoff
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, path: &str) -> FetchResult<RawResponse> {
        let url = self.url_for(path)?;
        let max_attempts = self.retry.max_attempts();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let result = self.transport.get(&url).await;
            match self.classify(path, attempt, result) {
                AttemptOutcome::Success(response) => {
                    if attempt > 1 {
                        debug!(
                            "Fetch of '{}' succeeded on attempt {}/{}",
                            path, attempt, max_attempts
                        );
                    }
                    return Ok(response);
                }
                AttemptOutcome::Terminal(err) => {
                    debug!("Fetch of '{}' ended with terminal outcome: {}", path, err);
                    return Err(err);
                }
                AttemptOutcome::Transient(message) => {
                    if attempt < max_attempts {
                        let delay = self.retry.delay_for(attempt);
                        warn!(
                            "Fetch of '{}' failed on attempt {}/{}, retrying in {:?}: {}",
                            path, attempt, max_attempts, delay, message
                        );
                        sleep(delay).await;
                    } else {
                        warn!(
                            "Fetch of '{}' failed after {} attempts: {}",
                            path, max_attempts, message
                        );
                    }
                    last_error = message;
                }
            }
        }

        Err(FetchError::Unavailable {
            attempts: max_attempts,
            message: last_error,
        })
    }

    /// Single non-retried request against the site root
    pub async fn probe(&self) -> UpstreamStatus {
        let url = match self.url_for("/") {
            Ok(url) => url,
            Err(e) => {
                return UpstreamStatus::Offline {
                    reason: e.to_string(),
                };
            }
        };

        let started = Instant::now();
        let result = self.transport.get(&url).await;
        let latency_ms = duration_ms(started.elapsed());

        match result {
            Ok(response) if response.is_success() => UpstreamStatus::Online { latency_ms },
            Ok(response) => UpstreamStatus::Degraded {
                status: response.status,
                latency_ms,
            },
            Err(e) => UpstreamStatus::Offline {
                reason: e.to_string(),
            },
        }
    }

    fn classify(
        &self,
        path: &str,
        attempt: u32,
        result: Result<RawResponse, TransportError>,
    ) -> AttemptOutcome {
        let response = match result {
            Ok(response) => response,
            Err(err) if err.is_transient() => return AttemptOutcome::Transient(err.to_string()),
            Err(err) => {
                return AttemptOutcome::Terminal(FetchError::Unavailable {
                    attempts: attempt,
                    message: err.to_string(),
                });
            }
        };

        match response.status {
            404 => AttemptOutcome::Terminal(FetchError::NotFound {
                path: path.to_string(),
            }),
            status if (200..300).contains(&status) => AttemptOutcome::Success(response),
            status @ (408 | 429 | 500..=599) => AttemptOutcome::Transient(format!("HTTP {status}")),
            status => AttemptOutcome::Terminal(FetchError::Rejected { status }),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
