//! Upstream source access
//!
//! The fetcher turns relative paths on the ratings site into classified
//! responses, retrying transient failures on top of an [`HttpTransport`].
//!
//! [`HttpTransport`]: crate::utils::HttpTransport

pub mod fetcher;

pub use fetcher::{Fetcher, UpstreamStatus};
