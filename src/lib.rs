//! Player statistics for the RTanks ratings site
//!
//! Fetches player profile pages, parses and normalizes them into
//! [`PlayerRecord`]s, collapses concurrent lookups of the same player and
//! caches results with a TTL. A background poller keeps the site-wide online
//! player count fresh.

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod parser;
pub mod services;
pub mod sources;
pub mod utils;

pub use client::RtanksClient;
pub use config::Config;
pub use errors::{StatsError, StatsResult};
pub use models::PlayerRecord;
pub use services::{LookupOutcome, LookupStats, OnlineCount};
pub use sources::UpstreamStatus;
