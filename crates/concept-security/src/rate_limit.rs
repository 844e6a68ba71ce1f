use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Tracked clients above which `check` sweeps stale entries inline.
const SWEEP_THRESHOLD: usize = 4096;

/// Sliding-window rate limiter keyed by client.
///
/// Each client may make `max_requests` requests in any `window`. Clients with
/// no request inside the window are dropped by [`RateLimiter::cleanup`], and
/// opportunistically once the map grows past a threshold, so memory stays
/// bounded by the number of recently active clients.
pub struct RateLimiter<K = IpAddr> {
    max_requests: usize,
    window: Duration,
    clients: Mutex<HashMap<K, VecDeque<Instant>>>,
}

impl<K: Hash + Eq + Clone> RateLimiter<K> {
    /// Create a new rate limiter.
    /// - `max_requests`: requests allowed per window
    /// - `window`: length of the sliding window
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Requests allowed per window.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Length of the sliding window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a request for `key`.
    /// Returns `true` if allowed, `false` if rate limited.
    pub async fn check(&self, key: K) -> bool {
        let mut clients = self.clients.lock().await;
        let now = Instant::now();

        if clients.len() > SWEEP_THRESHOLD {
            let window = self.window;
            clients.retain(|_, hits| {
                hits.back()
                    .is_some_and(|last| now.duration_since(*last) < window)
            });
        }

        let hits = clients.entry(key).or_default();
        while hits
            .front()
            .is_some_and(|first| now.duration_since(*first) >= self.window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.max_requests {
            false
        } else {
            hits.push_back(now);
            true
        }
    }

    /// Requests `key` may still make in the current window.
    pub async fn remaining(&self, key: &K) -> usize {
        let clients = self.clients.lock().await;
        let now = Instant::now();
        let used = clients.get(key).map_or(0, |hits| {
            hits.iter()
                .filter(|t| now.duration_since(**t) < self.window)
                .count()
        });
        self.max_requests.saturating_sub(used)
    }

    /// Remove clients with no request inside the window.
    pub async fn cleanup(&self) {
        let mut clients = self.clients.lock().await;
        let now = Instant::now();
        let before = clients.len();
        clients.retain(|_, hits| {
            hits.back()
                .is_some_and(|last| now.duration_since(*last) < self.window)
        });
        debug!(evicted = before - clients.len(), "Rate limiter cleanup");
    }

    /// Number of clients currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}
