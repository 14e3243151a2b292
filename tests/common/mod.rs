#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rtanks_stats::Config;
use rtanks_stats::errors::TransportError;
use rtanks_stats::utils::{HttpTransport, RawResponse};

pub const BASE_URL: &str = "https://ratings.ranked-rtanks.online";

/// What the fake site answers for one request
#[derive(Debug, Clone)]
pub enum Reply {
    Page(u16, String),
    Timeout,
}

pub fn ok(body: impl Into<String>) -> Reply {
    Reply::Page(200, body.into())
}

/// In-memory ratings site keyed by request path
///
/// Each path holds a queue of replies; the last reply repeats. Unknown paths
/// answer 404.
pub struct FakeSite {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, u32>>,
    latency: Duration,
    closed: AtomicBool,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            latency,
            closed: AtomicBool::new(false),
        }
    }

    pub fn route(&self, path: &str, replies: Vec<Reply>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), replies.into());
    }

    pub fn calls(&self, path: &str) -> u32 {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn next_reply(&self, path: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or(Reply::Page(404, String::new())),
            None => Reply::Page(404, String::new()),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeSite {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        if self.is_closed() {
            return Err(TransportError::SessionClosed);
        }
        let path = url.trim_start_matches(BASE_URL).to_string();
        *self.calls.lock().unwrap().entry(path.clone()).or_default() += 1;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.next_reply(&path) {
            Reply::Page(status, body) => Ok(RawResponse::new(url, status, body)),
            Reply::Timeout => Err(TransportError::Timeout {
                url: url.to_string(),
            }),
        }
    }

    fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.scraper.base_url = BASE_URL.to_string();
    config
}

pub fn profile_page(name: &str, kills: u64, deaths: u64) -> String {
    format!(
        r#"<html><body>
        <div class="player-identity">
          <span class="player-name">{name}</span>
          <span class="player-clan">[Wolves]</span>
          <span class="status online">Online</span>
        </div>
        <div class="player-rank"><span class="rank-name">Major</span></div>
        <div class="experience">400 000 / 455 000</div>
        <table class="player-stats">
          <tr><th>Kills</th><td>{kills}</td></tr>
          <tr><th>Deaths</th><td>{deaths}</td></tr>
          <tr><th>Gold boxes</th><td>2</td></tr>
        </table>
        <div class="equipment" data-category="turrets">
          <div class="item equipped">Smoky M0</div>
          <div class="item">Railgun M3</div>
        </div>
        <div class="equipment" data-category="hulls">
          <div class="item equipped">Hunter M2</div>
        </div>
        </body></html>"#
    )
}

pub fn online_page(count: u64) -> String {
    format!(r#"<html><body><header>Online: <span class="online-count">{count}</span></header></body></html>"#)
}
