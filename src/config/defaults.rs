/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
use std::time::Duration;

// Scraper defaults
pub const DEFAULT_BASE_URL: &str = "https://ratings.ranked-rtanks.online";
pub const DEFAULT_PROFILE_PATH_PREFIX: &str = "/user/";
pub const DEFAULT_USER_AGENT: &str = concat!("rtanks-stats/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(5);
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(3600);
pub const DEFAULT_RETRY_JITTER_PERCENT: u8 = 0;
pub const DEFAULT_NOT_FOUND_MARKERS: &[&str] = &[
    "player not found",
    "user not found",
    "игрок не найден",
    "пользователь не найден",
];

// Cache defaults
pub const DEFAULT_PLAYER_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_NOT_FOUND_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

// Online poller defaults
pub const DEFAULT_POLL_ENABLED: bool = true;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_ONLINE_PATH: &str = "/";
