use async_trait::async_trait;
use reqwest::Client;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ScraperConfig;
use crate::errors::TransportError;

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new<U: Into<String>, B: Into<String>>(url: U, status: u16, body: B) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP transport the fetcher is built on
///
/// One call is one attempt: implementations must not retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET an absolute URL and return its status and body
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;

    /// Release pooled resources; `true` only for the call that released them
    fn close(&self) -> bool {
        false
    }
}

/// Owner of the pooled HTTP client shared by every upstream request
///
/// The client is created once with a fixed per-request timeout. `close()`
/// drops the pool exactly once; later `acquire()` calls fail with
/// [`TransportError::SessionClosed`].
pub struct SessionManager {
    client: RwLock<Option<Client>>,
    timeout: Duration,
}

impl SessionManager {
    /// Create the pooled client from scraper configuration
    pub fn new(config: &ScraperConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| TransportError::Other {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        debug!(
            "HTTP session created (timeout: {:?}, user agent: {})",
            config.request_timeout, config.user_agent
        );

        Ok(Self {
            client: RwLock::new(Some(client)),
            timeout: config.request_timeout,
        })
    }

    /// Shared handle to the pooled client
    pub fn acquire(&self) -> Result<Client, TransportError> {
        let guard = self.client.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().ok_or(TransportError::SessionClosed)
    }

    /// Release the pool; returns `true` only for the call that actually closed it
    pub fn close(&self) -> bool {
        let mut guard = self.client.write().unwrap_or_else(|e| e.into_inner());
        let closed = guard.take().is_some();
        if closed {
            info!("HTTP session closed");
        }
        closed
    }

    pub fn is_closed(&self) -> bool {
        self.client
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl HttpTransport for SessionManager {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        let client = self.acquire()?;

        let response = client.get(url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        debug!(
            "GET {} -> {} ({} bytes)",
            final_url,
            status,
            body.len()
        );

        Ok(RawResponse::new(final_url, status, body))
    }

    fn close(&self) -> bool {
        SessionManager::close(self)
    }
}
