use clap::Parser;
use std::net::SocketAddr;
use validator::Validate;

use crate::error::{GateError, Result};
use crate::path_filter::{PathFilter, DEFAULT_EXCLUDE_PATTERN};
use crate::rate_limit_config::RateLimitConfig;

/// Service configuration, read from flags with environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "gatekeeper", version, about = "Per-client sliding-window rate limiting gate")]
pub struct Config {
    /// Server bind address
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    /// Bind address for the admin endpoints; keep it off the public network
    #[arg(long, env = "ADMIN_BIND_ADDR", default_value = "127.0.0.1:3001")]
    pub admin_addr: SocketAddr,

    /// Rate limit window length in milliseconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_MS", default_value_t = 60_000)]
    pub window_ms: u64,

    /// Maximum requests per client per window
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = 60)]
    pub max_requests: u64,

    /// Regex of request paths that bypass the limiter; empty limits every path
    #[arg(long, env = "RATE_LIMIT_EXCLUDE", default_value = DEFAULT_EXCLUDE_PATTERN)]
    pub exclude_pattern: String,

    /// Also sweep idle clients from a timer, not only on incoming traffic
    #[arg(long, env = "RATE_LIMIT_BACKGROUND_SWEEP")]
    pub background_sweep: bool,

    /// Log level for the gatekeeper target
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.window_ms, self.max_requests)
    }

    pub fn path_filter(&self) -> Result<PathFilter> {
        PathFilter::new(&self.exclude_pattern)
    }

    /// Check every setting before the server starts.
    pub fn validate(&self) -> Result<()> {
        self.rate_limit().validate()?;
        self.path_filter()?;
        if self.admin_addr == self.bind_addr {
            return Err(GateError::Config(format!(
                "admin address {} must differ from bind address",
                self.admin_addr
            )));
        }
        Ok(())
    }
}
