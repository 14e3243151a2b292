//! Player lookup service
//!
//! Collapses concurrent lookups of the same player into one upstream
//! pipeline (fetch → parse → normalize) and caches terminal outcomes with a
//! TTL. Per key the state moves absent → in-flight → cached-fresh →
//! cached-stale; stale entries stay in place until refreshed or evicted by
//! the LRU bound.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared, join_all};
use lru::LruCache;
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::normalizer::normalize;
use crate::config::{CacheConfig, ScraperConfig};
use crate::errors::{FetchError, ParseError, StatsError, StatsResult};
use crate::models::PlayerRecord;
use crate::parser::parse_profile;
use crate::sources::Fetcher;
use crate::utils::{HttpTransport, SessionManager, UrlUtils};

/// Terminal result of a lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(Arc<PlayerRecord>),
    NotFound,
}

impl LookupOutcome {
    pub fn into_option(self) -> Option<Arc<PlayerRecord>> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    outcome: LookupOutcome,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

type SharedLookup = Shared<BoxFuture<'static, StatsResult<LookupOutcome>>>;

struct LookupState {
    cache: LruCache<String, CacheEntry>,
    in_flight: HashMap<String, SharedLookup>,
}

#[derive(Debug, Default)]
struct Counters {
    cache_hits: AtomicU64,
    negative_hits: AtomicU64,
    collapsed_waiters: AtomicU64,
    upstream_lookups: AtomicU64,
    found: AtomicU64,
    not_found: AtomicU64,
    failures: AtomicU64,
    parse_anomalies: AtomicU64,
    pipeline_ms: AtomicU64,
}

/// Snapshot of lookup activity since startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookupStats {
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    /// Fresh cached players served without a fetch
    pub cache_hits: u64,
    /// Fresh cached "not found" outcomes served without a fetch
    pub negative_hits: u64,
    /// Callers that joined an already running lookup
    pub collapsed_waiters: u64,
    /// Pipelines actually started against the upstream site
    pub upstream_lookups: u64,
    pub found: u64,
    pub not_found: u64,
    pub failures: u64,
    /// Profile pages whose markup could not be understood
    pub parse_anomalies: u64,
    pub total_pipeline_ms: u64,
    pub cached_entries: usize,
    pub in_flight: usize,
}

impl LookupStats {
    /// Mean time spent per upstream pipeline
    pub fn average_pipeline_ms(&self) -> u64 {
        if self.upstream_lookups == 0 {
            0
        } else {
            self.total_pipeline_ms / self.upstream_lookups
        }
    }

    /// Percentage of upstream pipelines that ended in a terminal outcome
    pub fn success_rate(&self) -> f64 {
        let finished = self.found + self.not_found + self.failures;
        if finished == 0 {
            return 100.0;
        }
        (self.found + self.not_found) as f64 * 100.0 / finished as f64
    }
}

struct Inner<T: HttpTransport> {
    fetcher: Arc<Fetcher<T>>,
    profile_path_prefix: String,
    /// Lowercased phrases the site shows in place of a profile
    not_found_markers: Vec<String>,
    player_ttl: Duration,
    not_found_ttl: Duration,
    state: Mutex<LookupState>,
    counters: Counters,
    started_at: DateTime<Utc>,
    started: Instant,
}

/// Cached, request-collapsing player lookups
pub struct PlayerService<T: HttpTransport = SessionManager> {
    inner: Arc<Inner<T>>,
}

impl<T: HttpTransport> Clone for PlayerService<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Cache key for a username: trimmed and lowercased
pub fn normalize_key(username: &str) -> String {
    username.trim().to_lowercase()
}

impl<T: HttpTransport + 'static> PlayerService<T> {
    pub fn new(fetcher: Arc<Fetcher<T>>, scraper: &ScraperConfig, config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        let not_found_markers = scraper
            .not_found_markers
            .iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        Self {
            inner: Arc::new(Inner {
                fetcher,
                profile_path_prefix: scraper.profile_path_prefix.clone(),
                not_found_markers,
                player_ttl: config.player_ttl,
                not_found_ttl: config.not_found_ttl,
                state: Mutex::new(LookupState {
                    cache: LruCache::new(capacity),
                    in_flight: HashMap::new(),
                }),
                counters: Counters::default(),
                started_at: Utc::now(),
                started: Instant::now(),
            }),
        }
    }

    pub fn fetcher(&self) -> &Arc<Fetcher<T>> {
        &self.inner.fetcher
    }

    /// Relative profile path for a username
    pub fn profile_path(&self, username: &str) -> String {
        UrlUtils::profile_path(&self.inner.profile_path_prefix, &normalize_key(username))
    }

    /// Look up a player, serving fresh cache entries and joining running lookups
    #[instrument(skip(self), level = "debug")]
    pub async fn get_player(&self, username: &str) -> StatsResult<LookupOutcome> {
        let key = normalize_key(username);
        if key.is_empty() {
            return Ok(LookupOutcome::NotFound);
        }

        let lookup = {
            let mut state = self.inner.state.lock().await;
            let now = Instant::now();

            if let Some(entry) = state.cache.get(&key)
                && entry.is_fresh(now)
            {
                let counter = match entry.outcome {
                    LookupOutcome::Found(_) => &self.inner.counters.cache_hits,
                    LookupOutcome::NotFound => &self.inner.counters.negative_hits,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                debug!(username = %key, "Serving cached lookup");
                return Ok(entry.outcome.clone());
            }

            match state.in_flight.get(&key) {
                Some(running) => {
                    self.inner
                        .counters
                        .collapsed_waiters
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(username = %key, "Joining in-flight lookup");
                    running.clone()
                }
                None => {
                    let lookup = self.spawn_lookup(key.clone());
                    state.in_flight.insert(key.clone(), lookup.clone());
                    lookup
                }
            }
        };

        lookup.await
    }

    /// Start the pipeline in its own task so dropped callers do not cancel it
    ///
    /// Must be called with the state lock held: the task's final bookkeeping
    /// takes the same lock, so it cannot run before the marker is registered.
    fn spawn_lookup(&self, key: String) -> SharedLookup {
        let inner = Arc::clone(&self.inner);
        inner
            .counters
            .upstream_lookups
            .fetch_add(1, Ordering::Relaxed);

        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let result = AssertUnwindSafe(inner.run_pipeline(&key))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(StatsError::unavailable("lookup pipeline panicked")));
            inner.finish(&key, &result, started.elapsed()).await;
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(StatsError::unavailable(format!("lookup task failed: {e}"))))
        }
        .boxed()
        .shared()
    }

    /// Drop the cached entry for one player
    pub async fn invalidate(&self, username: &str) -> bool {
        let key = normalize_key(username);
        let removed = self.inner.state.lock().await.cache.pop(&key).is_some();
        if removed {
            debug!(username = %key, "Cache entry invalidated");
        }
        removed
    }

    /// Drop every cached entry; in-flight lookups are unaffected
    pub async fn clear(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let count = state.cache.len();
        state.cache.clear();
        info!("Cleared {} cached player entries", count);
        count
    }

    /// Whether any entry (fresh or stale) is held for the player
    pub async fn is_cached(&self, username: &str) -> bool {
        let key = normalize_key(username);
        self.inner.state.lock().await.cache.contains(&key)
    }

    pub async fn stats(&self) -> LookupStats {
        let (cached_entries, in_flight) = {
            let state = self.inner.state.lock().await;
            (state.cache.len(), state.in_flight.len())
        };
        let c = &self.inner.counters;
        LookupStats {
            started_at: self.inner.started_at,
            uptime_secs: self.inner.started.elapsed().as_secs(),
            cache_hits: c.cache_hits.load(Ordering::Relaxed),
            negative_hits: c.negative_hits.load(Ordering::Relaxed),
            collapsed_waiters: c.collapsed_waiters.load(Ordering::Relaxed),
            upstream_lookups: c.upstream_lookups.load(Ordering::Relaxed),
            found: c.found.load(Ordering::Relaxed),
            not_found: c.not_found.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            parse_anomalies: c.parse_anomalies.load(Ordering::Relaxed),
            total_pipeline_ms: c.pipeline_ms.load(Ordering::Relaxed),
            cached_entries,
            in_flight,
        }
    }

    /// Wait until no lookup is running
    pub async fn drain(&self) {
        loop {
            let pending: Vec<SharedLookup> = {
                let state = self.inner.state.lock().await;
                state.in_flight.values().cloned().collect()
            };
            if pending.is_empty() {
                return;
            }
            debug!("Waiting for {} in-flight lookups", pending.len());
            join_all(pending).await;
        }
    }
}

impl<T: HttpTransport> Inner<T> {
    async fn run_pipeline(&self, key: &str) -> StatsResult<LookupOutcome> {
        let path = UrlUtils::profile_path(&self.profile_path_prefix, key);

        let response = match self.fetcher.fetch(&path).await {
            Ok(response) => response,
            Err(FetchError::NotFound { .. }) => {
                debug!(username = %key, "Player not found upstream");
                return Ok(LookupOutcome::NotFound);
            }
            Err(e) => {
                warn!(username = %key, error = %e, "Player lookup failed");
                return Err(e.into());
            }
        };

        let parsed = match parse_profile(&response) {
            Ok(parsed) => parsed,
            Err(ParseError::MissingAnchor { .. }) if self.is_not_found_page(&response.body) => {
                debug!(username = %key, "Profile page reports no such player");
                return Ok(LookupOutcome::NotFound);
            }
            Err(e) => {
                self.counters.parse_anomalies.fetch_add(1, Ordering::Relaxed);
                error!(
                    username = %key,
                    url = %response.url,
                    error = %e,
                    "Profile page markup not recognized; upstream layout may have changed"
                );
                return Err(e.into());
            }
        };

        Ok(LookupOutcome::Found(Arc::new(normalize(parsed))))
    }

    /// Only consulted once the identity block is known to be absent
    fn is_not_found_page(&self, body: &str) -> bool {
        let body = body.to_lowercase();
        self.not_found_markers
            .iter()
            .any(|marker| body.contains(marker.as_str()))
    }

    /// Record the outcome and clear the in-flight marker
    async fn finish(&self, key: &str, result: &StatsResult<LookupOutcome>, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.counters
            .pipeline_ms
            .fetch_add(elapsed_ms, Ordering::Relaxed);

        let mut state = self.state.lock().await;
        state.in_flight.remove(key);

        // Unavailable and markup failures are never cached
        let (outcome, ttl) = match result {
            Ok(outcome @ LookupOutcome::Found(_)) => {
                self.counters.found.fetch_add(1, Ordering::Relaxed);
                (outcome, self.player_ttl)
            }
            Ok(outcome @ LookupOutcome::NotFound) => {
                self.counters.not_found.fetch_add(1, Ordering::Relaxed);
                (outcome, self.not_found_ttl)
            }
            Err(_) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let entry = CacheEntry {
            outcome: outcome.clone(),
            stored_at: Instant::now(),
            ttl,
        };
        if let Some((evicted, _)) = state.cache.push(key.to_string(), entry)
            && evicted != key
        {
            debug!(evicted = %evicted, "Cache full, evicted least recently used player");
        }
        debug!(username = %key, elapsed_ms, "Lookup pipeline finished");
    }
}
