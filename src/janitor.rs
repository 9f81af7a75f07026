//! Periodic eviction of idle client windows.
//!
//! Sweeps are piggybacked on request handling: every check calls
//! [`Janitor::maybe_run`], which sweeps at most once per window. An optional
//! background task drives the same entry point from a timer so idle services
//! still release memory.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::rate_limiter::RateLimiter;
use crate::store::WindowStore;

#[derive(Debug)]
pub struct Janitor {
    window_ms: u64,
    last_run: AtomicU64,
}

impl Janitor {
    pub fn new(window_ms: u64, started_at: u64) -> Self {
        Self {
            window_ms,
            last_run: AtomicU64::new(started_at),
        }
    }

    pub fn last_run(&self) -> u64 {
        self.last_run.load(Ordering::Acquire)
    }

    /// Sweep `store` if a full window has passed since the last sweep.
    ///
    /// Concurrent callers race on the last-run timestamp and only the winner
    /// sweeps. Returns the number of evicted keys when a sweep ran.
    pub fn maybe_run(&self, store: &WindowStore, now: u64) -> Option<usize> {
        let last = self.last_run();
        if now.saturating_sub(last) < self.window_ms {
            return None;
        }

        if self
            .last_run
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        let evicted = store.sweep(now, self.window_ms);
        debug!(
            target: "gatekeeper::janitor",
            evicted,
            tracked = store.len(),
            "Window sweep completed"
        );
        Some(evicted)
    }
}

/// Drive the limiter's janitor from a timer ticking once per window.
pub fn spawn(limiter: RateLimiter) -> JoinHandle<()> {
    let period = limiter.config().window().max(Duration::from_millis(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            limiter.sweep();
        }
    })
}
