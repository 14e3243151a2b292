//! Error type definitions for the RTanks stats pipeline
//!
//! Network level failures are separated from classified fetch outcomes so the
//! fetcher can decide what is worth retrying, and parse failures are kept
//! distinct from "not found" because they signal a markup change upstream.

use thiserror::Error;

/// A single HTTP attempt failed before a status code was available
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request exceeded the session timeout
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    /// The connection could not be established
    #[error("Connection failed: {url} - {message}")]
    Connect { url: String, message: String },

    /// The response body could not be read
    #[error("Failed to read response body: {message}")]
    Body { message: String },

    /// The session manager has been closed
    #[error("HTTP session is closed")]
    SessionClosed,

    /// Anything else reported by the HTTP client
    #[error("HTTP client error: {message}")]
    Other { message: String },
}

impl TransportError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::SessionClosed)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        if err.is_timeout() {
            Self::Timeout { url }
        } else if err.is_connect() {
            Self::Connect {
                url,
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            Self::Body {
                message: err.to_string(),
            }
        } else {
            Self::Other {
                message: err.to_string(),
            }
        }
    }
}

/// Classified outcome of a fetch once the retry policy has been applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The upstream site says the player does not exist (terminal)
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Transient failures persisted through every retry
    #[error("Upstream unavailable after {attempts} attempt(s): {message}")]
    Unavailable { attempts: u32, message: String },

    /// The upstream site refused the request with a non-retryable status
    #[error("Upstream rejected request: HTTP {status}")]
    Rejected { status: u16 },
}

/// The document does not look like the page we expected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The player identity block is missing or empty
    #[error("Profile page is missing its identity block ({context})")]
    MissingAnchor { context: &'static str },

    /// A selector failed to compile
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// The aggregate page has no recognizable online counter
    #[error("Online player count not found on page")]
    MissingOnlineCount,
}

/// Errors surfaced by the lookup service
///
/// `Clone` so that the result of one in-flight pipeline can be handed to every
/// waiter that joined it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// The upstream site could not be reached or kept failing
    #[error("Stats service unavailable: {message}")]
    Unavailable { message: String },

    /// The upstream markup changed; reported to users as unavailable
    #[error("Unexpected profile page structure: {0}")]
    Parse(#[from] ParseError),

    /// The request itself was malformed
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl StatsError {
    /// Create an unavailable error with a custom message
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Whether this failure indicates the site markup changed
    pub fn is_markup_change(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

impl From<FetchError> for StatsError {
    fn from(err: FetchError) -> Self {
        match err {
            // Callers handle NotFound before converting; keep the message if one slips through.
            FetchError::NotFound { path } => Self::unavailable(format!("unexpected not found: {path}")),
            other => Self::unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_closed_is_not_transient() {
        assert!(!TransportError::SessionClosed.is_transient());
        assert!(
            TransportError::Timeout {
                url: "http://x".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_fetch_error_maps_to_unavailable() {
        let err: StatsError = FetchError::Rejected { status: 403 }.into();
        assert!(matches!(err, StatsError::Unavailable { .. }));
        assert!(!err.is_markup_change());
    }

    #[test]
    fn test_parse_error_is_markup_change() {
        let err: StatsError = ParseError::MissingAnchor {
            context: "player name",
        }
        .into();
        assert!(err.is_markup_change());
    }
}
