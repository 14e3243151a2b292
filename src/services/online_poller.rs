//! Background poller for the site-wide online player count

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::errors::{StatsError, StatsResult};
use crate::parser::parse_online_count;
use crate::sources::Fetcher;
use crate::utils::{HttpTransport, SessionManager};

/// Last known good online count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OnlineCount {
    pub count: u64,
    /// `None` until the first successful poll
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct OnlinePoller<T: HttpTransport = SessionManager> {
    fetcher: Arc<Fetcher<T>>,
    path: String,
    interval: Duration,
    slot: watch::Sender<OnlineCount>,
}

impl<T: HttpTransport> OnlinePoller<T> {
    pub fn new(fetcher: Arc<Fetcher<T>>, config: &PollerConfig) -> Self {
        let (slot, _) = watch::channel(OnlineCount::default());
        Self {
            fetcher,
            path: config.path.clone(),
            interval: config.interval,
            slot,
        }
    }

    /// Receiver notified when the count changes (and on the first success)
    pub fn subscribe(&self) -> watch::Receiver<OnlineCount> {
        self.slot.subscribe()
    }

    pub fn current(&self) -> OnlineCount {
        *self.slot.borrow()
    }

    /// Fetch and publish the count once; failures leave the previous value
    pub async fn poll_once(&self) -> StatsResult<u64> {
        let response = self.fetcher.fetch(&self.path).await.map_err(StatsError::from)?;
        let count = parse_online_count(&response)?;

        // updated_at is always refreshed; subscribers only wake on a new count
        self.slot.send_if_modified(|current| {
            let changed = current.updated_at.is_none() || current.count != count;
            if changed {
                debug!(previous = current.count, count, "Online player count changed");
            }
            *current = OnlineCount {
                count,
                updated_at: Some(Utc::now()),
            };
            changed
        });
        Ok(count)
    }

    /// Poll on a fixed interval until the token is cancelled
    pub async fn run(&self, token: CancellationToken) {
        info!(
            "Starting online count poller (interval: {:?}, path: {})",
            self.interval, self.path
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        result = self.poll_once() => {
                            if let Err(e) = result {
                                warn!(
                                    last_count = self.current().count,
                                    "Online count poll failed, keeping last value: {}", e
                                );
                            }
                        }
                    }
                }
            }
        }

        info!("Online count poller stopped");
    }
}

/// Spawn `run` on the runtime, returning its handle
pub fn spawn_poller<T: HttpTransport + 'static>(
    poller: Arc<OnlinePoller<T>>,
    token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move { poller.run(token).await })
}
