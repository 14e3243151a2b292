//! Lookup pipeline services
//!
//! - [`normalizer`]: parsed page fields → [`PlayerRecord`](crate::models::PlayerRecord)
//! - [`player_service`]: request collapsing and the TTL/LRU player cache
//! - [`online_poller`]: periodic refresh of the online player count

pub mod normalizer;
pub mod online_poller;
pub mod player_service;

pub use normalizer::{compute_kd_ratio, normalize};
pub use online_poller::{OnlineCount, OnlinePoller};
pub use player_service::{LookupOutcome, LookupStats, PlayerService};
