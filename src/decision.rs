//! Sliding-log admission decisions.
//!
//! A client's window is the ordered list of millisecond timestamps of its
//! admitted requests. Each decision first drops timestamps that have left the
//! trailing window, then either records the new request or rejects it.

use serde::Serialize;

use crate::rate_limit_config::RateLimitConfig;

/// Outcome of a single admission decision plus the metadata reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub admitted: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Epoch seconds at which the oldest counted request leaves the window
    pub reset_epoch_secs: u64,
    /// Whole seconds until a slot frees up; only set on rejection
    pub retry_after_secs: Option<u64>,
}

/// Drop every timestamp at least `window_ms` older than `now`.
///
/// Timestamps must be non-decreasing. Timestamps later than `now` are kept.
pub fn prune(timestamps: &mut Vec<u64>, now: u64, window_ms: u64) {
    let expired = timestamps.partition_point(|&t| now.saturating_sub(t) >= window_ms);
    if expired > 0 {
        timestamps.drain(..expired);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdmissionDecider {
    window_ms: u64,
    max_requests: u64,
}

impl AdmissionDecider {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window_ms: config.window_ms,
            max_requests: config.max_requests,
        }
    }

    /// Decide on one request arriving at `now`, updating `timestamps` in place.
    ///
    /// On rejection the window is only pruned; the rejected request is not recorded.
    /// A `now` earlier than the newest recorded timestamp is treated as that
    /// timestamp, keeping the window sorted.
    pub fn decide(&self, timestamps: &mut Vec<u64>, now: u64) -> Decision {
        let now = timestamps.last().map_or(now, |&newest| now.max(newest));
        prune(timestamps, now, self.window_ms);

        if timestamps.len() as u64 >= self.max_requests {
            // max_requests >= 1, so the pruned window is non-empty here
            let oldest = timestamps.first().copied().unwrap_or(now);
            let expires_at = oldest.saturating_add(self.window_ms);
            let retry_after = expires_at.saturating_sub(now).div_ceil(1000).max(1);

            return Decision {
                admitted: false,
                limit: self.max_requests,
                remaining: 0,
                reset_epoch_secs: expires_at.div_ceil(1000),
                retry_after_secs: Some(retry_after),
            };
        }

        timestamps.push(now);
        let oldest = timestamps[0];

        Decision {
            admitted: true,
            limit: self.max_requests,
            remaining: self.max_requests - timestamps.len() as u64,
            reset_epoch_secs: oldest.saturating_add(self.window_ms).div_ceil(1000),
            retry_after_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: u64 = 60_000;
    const T0: u64 = 1_700_000_000_000;

    fn decider() -> AdmissionDecider {
        AdmissionDecider::new(&RateLimitConfig::new(WINDOW, 60))
    }

    #[test]
    fn test_prune_drops_expired_only() {
        let mut timestamps = vec![T0, T0 + 10, T0 + 20_000];
        prune(&mut timestamps, T0 + WINDOW + 10, WINDOW);
        assert_eq!(timestamps, vec![T0 + 20_000]);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut timestamps = vec![T0, T0 + 1_000, T0 + 59_000, T0 + 61_000];
        let now = T0 + 61_500;
        prune(&mut timestamps, now, WINDOW);
        let once = timestamps.clone();
        prune(&mut timestamps, now, WINDOW);
        assert_eq!(timestamps, once);
    }

    #[test]
    fn test_prune_keeps_future_timestamps() {
        let mut timestamps = vec![T0 + 5_000];
        prune(&mut timestamps, T0, WINDOW);
        assert_eq!(timestamps, vec![T0 + 5_000]);
    }

    #[test]
    fn test_boundary_sixty_admitted_sixty_first_rejected() {
        let decider = decider();
        let mut timestamps = Vec::new();

        for i in 0..60u64 {
            let decision = decider.decide(&mut timestamps, T0 + i * 100);
            assert!(decision.admitted, "request {} should be admitted", i + 1);
            assert_eq!(decision.remaining, 59 - i);
            assert_eq!(decision.limit, 60);
            assert_eq!(decision.retry_after_secs, None);
        }

        let decision = decider.decide(&mut timestamps, T0 + 6_000);
        assert!(!decision.admitted);
        assert_eq!(decision.remaining, 0);
        // oldest is T0, which frees up at T0 + 60s; 54s from now
        assert_eq!(decision.retry_after_secs, Some(54));
        assert_eq!(timestamps.len(), 60);
    }

    #[test]
    fn test_window_rollover_admits() {
        let decider = decider();
        let mut timestamps = Vec::new();
        for _ in 0..60 {
            assert!(decider.decide(&mut timestamps, T0).admitted);
        }

        let decision = decider.decide(&mut timestamps, T0 + WINDOW + 1);
        assert!(decision.admitted);
        assert_eq!(timestamps, vec![T0 + WINDOW + 1]);
        assert_eq!(decision.remaining, 59);
    }

    #[test]
    fn test_exact_window_edge_is_expired() {
        let decider = AdmissionDecider::new(&RateLimitConfig::new(WINDOW, 1));
        let mut timestamps = Vec::new();
        assert!(decider.decide(&mut timestamps, T0).admitted);
        assert!(!decider.decide(&mut timestamps, T0 + WINDOW - 1).admitted);
        assert!(decider.decide(&mut timestamps, T0 + WINDOW).admitted);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let decider = AdmissionDecider::new(&RateLimitConfig::new(WINDOW, 1));
        let mut timestamps = Vec::new();
        decider.decide(&mut timestamps, T0);

        let decision = decider.decide(&mut timestamps, T0 + 59_001);
        assert_eq!(decision.retry_after_secs, Some(1));

        let decision = decider.decide(&mut timestamps, T0 + 500);
        assert_eq!(decision.retry_after_secs, Some(60));
    }

    #[test]
    fn test_reset_uses_oldest_counted_request() {
        let decider = decider();
        let mut timestamps = Vec::new();

        let first = decider.decide(&mut timestamps, 1_500);
        assert_eq!(first.reset_epoch_secs, (1_500 + WINDOW).div_ceil(1000));

        let second = decider.decide(&mut timestamps, 30_000);
        assert_eq!(second.reset_epoch_secs, first.reset_epoch_secs);
    }

    #[test]
    fn test_reset_matches_on_both_branches() {
        let decider = AdmissionDecider::new(&RateLimitConfig::new(WINDOW, 2));
        let mut timestamps = Vec::new();
        let admitted = decider.decide(&mut timestamps, T0 + 250);
        decider.decide(&mut timestamps, T0 + 1_000);
        let rejected = decider.decide(&mut timestamps, T0 + 2_000);

        assert!(!rejected.admitted);
        assert_eq!(rejected.reset_epoch_secs, admitted.reset_epoch_secs);
    }

    #[test]
    fn test_late_arrival_keeps_window_sorted() {
        let decider = AdmissionDecider::new(&RateLimitConfig::new(WINDOW, 60));
        let mut timestamps = Vec::new();
        decider.decide(&mut timestamps, T0 + 5);
        decider.decide(&mut timestamps, T0);

        assert_eq!(timestamps, vec![T0 + 5, T0 + 5]);

        prune(&mut timestamps, T0 + WINDOW + 2, WINDOW);
        assert_eq!(timestamps.len(), 2);
    }

    #[test]
    fn test_late_arrival_cannot_free_a_slot() {
        let decider = AdmissionDecider::new(&RateLimitConfig::new(WINDOW, 2));
        let mut timestamps = Vec::new();
        assert!(decider.decide(&mut timestamps, T0 + 5).admitted);
        assert!(decider.decide(&mut timestamps, T0).admitted);

        let decision = decider.decide(&mut timestamps, T0 + WINDOW + 2);
        assert!(!decision.admitted);
        assert_eq!(decision.retry_after_secs, Some(1));
    }

    #[test]
    fn test_rejection_prunes_without_recording() {
        let decider = AdmissionDecider::new(&RateLimitConfig::new(WINDOW, 2));
        let mut timestamps = vec![T0 - WINDOW, T0, T0 + 10];

        let decision = decider.decide(&mut timestamps, T0 + 20);
        assert!(!decision.admitted);
        assert_eq!(timestamps, vec![T0, T0 + 10]);
    }
}
