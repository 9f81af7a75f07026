use std::sync::Arc;

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::decision::{prune, AdmissionDecider, Decision};
use crate::janitor::Janitor;
use crate::rate_limit_config::RateLimitConfig;
use crate::store::WindowStore;

/// Per-client sliding-window rate limiter.
///
/// Cheap to clone; clones share the same store, clock and janitor.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    config: RateLimitConfig,
    decider: AdmissionDecider,
    store: WindowStore,
    janitor: Janitor,
    clock: Arc<dyn Clock>,
}

/// Read-only view of one client's window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowStatus {
    pub key: String,
    pub limit: u64,
    pub requests_in_window: u64,
    pub remaining: u64,
    pub reset_epoch_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimiterStats {
    pub tracked_clients: usize,
    pub recorded_requests: usize,
    pub last_sweep_ms: u64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now_ms();
        Self {
            inner: Arc::new(Inner {
                config,
                decider: AdmissionDecider::new(&config),
                store: WindowStore::new(),
                janitor: Janitor::new(config.window_ms, started_at),
                clock,
            }),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &WindowStore {
        &self.inner.store
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.clock.now_ms()
    }

    /// Admit or reject one request from `key` at the current time.
    ///
    /// Gives the janitor a chance to sweep before deciding. The arrival time
    /// is read under the key's lock so concurrent requests record in order.
    pub fn check(&self, key: &str) -> Decision {
        self.inner.janitor.maybe_run(&self.inner.store, self.now_ms());

        let decider = self.inner.decider;
        let clock = &self.inner.clock;
        self.inner
            .store
            .update(key, |timestamps| decider.decide(timestamps, clock.now_ms()))
    }

    /// Admit or reject one request from `key` arriving at `now`.
    ///
    /// Prune, count and record happen under the key's lock.
    pub fn decide(&self, key: &str, now: u64) -> Decision {
        let decider = self.inner.decider;
        self.inner
            .store
            .update(key, |timestamps| decider.decide(timestamps, now))
    }

    /// Inspect a client's window without recording a request.
    pub fn status(&self, key: &str) -> WindowStatus {
        let now = self.now_ms();
        let window_ms = self.inner.config.window_ms;
        let limit = self.inner.config.max_requests;

        let mut timestamps = self.inner.store.get(key);
        prune(&mut timestamps, now, window_ms);
        let count = timestamps.len() as u64;

        WindowStatus {
            key: key.to_string(),
            limit,
            requests_in_window: count,
            remaining: limit.saturating_sub(count),
            reset_epoch_secs: timestamps
                .first()
                .map(|oldest| oldest.saturating_add(window_ms).div_ceil(1000)),
        }
    }

    /// Forget a client's window. Returns whether the key was tracked.
    pub fn reset(&self, key: &str) -> bool {
        self.inner.store.remove(key)
    }

    /// Run the janitor at the current time if it is due.
    pub fn sweep(&self) -> Option<usize> {
        let now = self.now_ms();
        self.inner.janitor.maybe_run(&self.inner.store, now)
    }

    pub fn stats(&self) -> LimiterStats {
        let mut tracked_clients = 0;
        let mut recorded_requests = 0;
        self.inner.store.for_each(|_, timestamps| {
            tracked_clients += 1;
            recorded_requests += timestamps.len();
        });

        LimiterStats {
            tracked_clients,
            recorded_requests,
            last_sweep_ms: self.inner.janitor.last_run(),
        }
    }
}
