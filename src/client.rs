//! Public entry point for bots and tools
//!
//! [`RtanksClient`] owns the HTTP session, the player cache and the online
//! count poller. It is built once at startup and torn down with
//! [`RtanksClient::close`].

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{StatsError, StatsResult};
use crate::models::PlayerRecord;
use crate::services::online_poller::spawn_poller;
use crate::services::player_service::normalize_key;
use crate::services::{LookupStats, OnlineCount, OnlinePoller, PlayerService};
use crate::sources::{Fetcher, UpstreamStatus};
use crate::utils::{HttpTransport, SessionManager};

pub struct RtanksClient<T: HttpTransport = SessionManager> {
    transport: Arc<T>,
    fetcher: Arc<Fetcher<T>>,
    players: PlayerService<T>,
    poller: Arc<OnlinePoller<T>>,
    poller_enabled: bool,
    poller_task: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
    closed: AtomicBool,
}

impl RtanksClient<SessionManager> {
    /// Create a client backed by a pooled reqwest session
    pub fn new(config: &Config) -> StatsResult<Self> {
        let session = SessionManager::new(&config.scraper)
            .map_err(|e| StatsError::unavailable(e.to_string()))?;
        Ok(Self::with_transport(Arc::new(session), config))
    }
}

impl<T: HttpTransport + 'static> RtanksClient<T> {
    pub fn with_transport(transport: Arc<T>, config: &Config) -> Self {
        let fetcher = Arc::new(Fetcher::new(Arc::clone(&transport), &config.scraper));
        let players = PlayerService::new(Arc::clone(&fetcher), &config.scraper, &config.cache);
        let poller = Arc::new(OnlinePoller::new(Arc::clone(&fetcher), &config.poller));

        Self {
            transport,
            fetcher,
            players,
            poller,
            poller_enabled: config.poller.enabled,
            poller_task: Mutex::new(None),
            shutdown: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Start the background online count poller
    ///
    /// Returns `false` when polling is disabled, already running, or the
    /// client has been closed. Must be called from within a Tokio runtime.
    pub fn start_poller(&self) -> bool {
        if !self.poller_enabled || self.is_closed() {
            return false;
        }
        let mut task = self.poller_task.lock().unwrap_or_else(|e| e.into_inner());
        if task.is_some() {
            return false;
        }
        *task = Some(spawn_poller(
            Arc::clone(&self.poller),
            self.shutdown.child_token(),
        ));
        true
    }

    /// Statistics for one player; `Ok(None)` when the player does not exist
    pub async fn get_player_data(&self, username: &str) -> StatsResult<Option<Arc<PlayerRecord>>> {
        self.players
            .get_player(username)
            .await
            .map(|outcome| outcome.into_option())
    }

    /// Last known online player count; 0 before the first successful poll
    pub fn get_online_players_count(&self) -> u64 {
        self.poller.current().count
    }

    pub fn online_count(&self) -> OnlineCount {
        self.poller.current()
    }

    /// Receiver woken only when the polled count changes
    pub fn subscribe_online_count(&self) -> watch::Receiver<OnlineCount> {
        self.poller.subscribe()
    }

    /// Poll the online count right now instead of waiting for the next tick
    pub async fn refresh_online_count(&self) -> StatsResult<u64> {
        self.poller.poll_once().await
    }

    /// Look up two different players concurrently
    pub async fn compare_players(
        &self,
        first: &str,
        second: &str,
    ) -> StatsResult<(Option<Arc<PlayerRecord>>, Option<Arc<PlayerRecord>>)> {
        let (a, b) = (normalize_key(first), normalize_key(second));
        if a.is_empty() || b.is_empty() {
            return Err(StatsError::invalid_request("two usernames are required"));
        }
        if a == b {
            return Err(StatsError::invalid_request(format!(
                "cannot compare '{first}' with itself"
            )));
        }

        let (first, second) = tokio::join!(self.get_player_data(&a), self.get_player_data(&b));
        Ok((first?, second?))
    }

    /// Single reachability probe of the ratings site
    pub async fn check_website_status(&self) -> UpstreamStatus {
        let status = self.fetcher.probe().await;
        debug!(?status, "Website status checked");
        status
    }

    pub async fn stats(&self) -> LookupStats {
        self.players.stats().await
    }

    /// Absolute profile page URL for a player
    pub fn profile_url(&self, username: &str) -> StatsResult<String> {
        let path = self.players.profile_path(username);
        Ok(self.fetcher.url_for(&path)?)
    }

    pub async fn invalidate(&self, username: &str) -> bool {
        self.players.invalidate(username).await
    }

    pub async fn clear_cache(&self) -> usize {
        self.players.clear().await
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop the poller, let running lookups finish, then close the session
    ///
    /// Only the first call does anything.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("Client already closed");
            return;
        }

        self.shutdown.cancel();
        let task = self
            .poller_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!("Online count poller ended abnormally: {}", e);
        }

        self.players.drain().await;

        if self.transport.close() {
            info!("RTanks client closed");
        }
    }
}

impl<T: HttpTransport> Drop for RtanksClient<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
