use anyhow::{Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::duration;

/// Environment variable prefix for overrides, e.g. `RTANKS_CACHE__PLAYER_TTL=10m`
pub const ENV_PREFIX: &str = "RTANKS_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub poller: PollerConfig,
}

/// Upstream site access: transport and retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_profile_path_prefix")]
    pub profile_path_prefix: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-attempt request timeout
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,
    /// Retries after the first attempt, transient failures only
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay", with = "duration")]
    pub retry_base_delay: Duration,
    #[serde(default = "default_retry_max_delay", with = "duration")]
    pub retry_max_delay: Duration,
    /// Additive jitter as a percentage of each backoff delay
    #[serde(default = "default_retry_jitter_percent")]
    pub retry_jitter_percent: u8,
    /// Body substrings (case-insensitive) that mean "no such player" on a page without a profile
    #[serde(default = "default_not_found_markers")]
    pub not_found_markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_player_ttl", with = "duration")]
    pub player_ttl: Duration,
    #[serde(default = "default_not_found_ttl", with = "duration")]
    pub not_found_ttl: Duration,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_poll_enabled")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval", with = "duration")]
    pub interval: Duration,
    #[serde(default = "default_online_path")]
    pub path: String,
}

// Scraper defaults
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_profile_path_prefix() -> String {
    DEFAULT_PROFILE_PATH_PREFIX.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_base_delay() -> Duration {
    DEFAULT_RETRY_BASE_DELAY
}

fn default_retry_max_delay() -> Duration {
    DEFAULT_RETRY_MAX_DELAY
}

fn default_retry_jitter_percent() -> u8 {
    DEFAULT_RETRY_JITTER_PERCENT
}

fn default_not_found_markers() -> Vec<String> {
    DEFAULT_NOT_FOUND_MARKERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// Cache defaults
fn default_player_ttl() -> Duration {
    DEFAULT_PLAYER_TTL
}

fn default_not_found_ttl() -> Duration {
    DEFAULT_NOT_FOUND_TTL
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

// Poller defaults
fn default_poll_enabled() -> bool {
    DEFAULT_POLL_ENABLED
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_online_path() -> String {
    DEFAULT_ONLINE_PATH.to_string()
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            profile_path_prefix: default_profile_path_prefix(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_base_delay: default_retry_base_delay(),
            retry_max_delay: default_retry_max_delay(),
            retry_jitter_percent: default_retry_jitter_percent(),
            not_found_markers: default_not_found_markers(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            player_ttl: default_player_ttl(),
            not_found_ttl: default_not_found_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: default_poll_enabled(),
            interval: default_poll_interval(),
            path: default_online_path(),
        }
    }
}

impl ScraperConfig {
    /// Reject settings the fetcher cannot work with
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid scraper.base_url '{}': {}", self.base_url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("scraper.base_url must be http or https, got '{}'", parsed.scheme());
        }
        if self.request_timeout.is_zero() {
            bail!("scraper.request_timeout must be greater than zero");
        }
        if self.retry_jitter_percent > 100 {
            bail!("scraper.retry_jitter_percent must be between 0 and 100");
        }
        if self.retry_max_delay > MAX_RETRY_DELAY {
            bail!(
                "scraper.retry_max_delay must be at most {}",
                humantime::format_duration(MAX_RETRY_DELAY)
            );
        }
        if self.retry_base_delay > self.retry_max_delay {
            bail!("scraper.retry_base_delay must not exceed scraper.retry_max_delay");
        }
        Ok(())
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            bail!("cache.max_entries must be greater than zero");
        }
        Ok(())
    }
}

impl PollerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            bail!("poller.interval must be greater than zero");
        }
        Ok(())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    /// Load configuration from a TOML file layered with `RTANKS_` environment overrides.
    ///
    /// A missing file is created with the default configuration.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if !Path::new(config_file).exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
        }

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scraper.validate()?;
        self.cache.validate()?;
        self.poller.validate()?;
        Ok(())
    }
}
