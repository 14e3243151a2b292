//! Utility modules shared by the fetch pipeline
//!
//! This module contains the transport layer, URL helpers and the retry
//! policy used by the fetcher.

pub mod http_client;
pub mod retry;
pub mod url;

// Re-export commonly used types for convenience
pub use http_client::{HttpTransport, RawResponse, SessionManager};
pub use retry::RetryConfig;
pub use self::url::UrlUtils;
