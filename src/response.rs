use serde::Serialize;
use std::time::Duration;

use crate::rate_limit_config::RateLimitConfig;
use crate::rate_limiter::LimiterStats;

/// Body of a 429 response.
#[derive(Debug, Serialize)]
pub struct RejectionBody {
    pub error: &'static str,
    #[serde(rename = "retryAfter")]
    pub retry_after: u64,
}

impl RejectionBody {
    pub fn new(retry_after: u64) -> Self {
        Self {
            error: "Too Many Requests",
            retry_after,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub tracked_clients: usize,
}

impl HealthResponse {
    pub fn healthy(tracked_clients: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tracked_clients,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    pub window_ms: u64,
    pub max_requests: u64,
    pub exclude_pattern: Option<String>,
    pub stats: LimiterStats,
}

impl SettingsResponse {
    pub fn new(config: &RateLimitConfig, exclude_pattern: Option<&str>, stats: LimiterStats) -> Self {
        Self {
            window: config.window(),
            window_ms: config.window_ms,
            max_requests: config.max_requests,
            exclude_pattern: exclude_pattern.map(str::to_string),
            stats,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub key: String,
    pub cleared: bool,
}
