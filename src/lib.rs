pub mod clock;
pub mod config;
pub mod decision;
pub mod error;
pub mod handlers;
pub mod janitor;
pub mod key_resolver;
pub mod middleware;
pub mod path_filter;
pub mod rate_limit_config;
pub mod rate_limiter;
pub mod response;
pub mod server;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use decision::Decision;
pub use error::{GateError, Result};
pub use rate_limit_config::RateLimitConfig;
pub use rate_limiter::RateLimiter;
pub use server::create_app;
