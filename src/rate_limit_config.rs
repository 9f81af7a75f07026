use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

pub const DEFAULT_WINDOW_MS: u64 = 60_000;
pub const DEFAULT_MAX_REQUESTS: u64 = 60;

/// Sliding window parameters, fixed for the lifetime of a limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RateLimitConfig {
    /// Length of the trailing window in milliseconds
    #[validate(range(min = 1, message = "window must be at least 1ms"))]
    pub window_ms: u64,

    /// Maximum admitted requests per client within one window
    #[validate(range(min = 1, message = "at least one request per window must be allowed"))]
    pub max_requests: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

impl RateLimitConfig {
    pub fn new(window_ms: u64, max_requests: u64) -> Self {
        Self {
            window_ms,
            max_requests,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}
