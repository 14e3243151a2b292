//! Centralized error handling for the RTanks stats pipeline
//!
//! Errors are layered the same way the pipeline is:
//!
//! - **Transport Errors**: a single HTTP attempt failed (timeout, connect, body)
//! - **Fetch Errors**: the classified outcome of a fetch after retries
//! - **Parse Errors**: the page does not have the structure of a profile page
//! - **Stats Errors**: what callers of the lookup service see
//!
//! # Usage
//!
//! ```rust
//! use rtanks_stats::errors::{StatsError, StatsResult};
//!
//! fn example_function() -> StatsResult<u64> {
//!     Err(StatsError::unavailable("upstream returned HTTP 503"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for lookup results
pub type StatsResult<T> = Result<T, StatsError>;

/// Convenience type alias for fetcher results
pub type FetchResult<T> = Result<T, FetchError>;

/// Convenience type alias for parser results
pub type ParseResult<T> = Result<T, ParseError>;
