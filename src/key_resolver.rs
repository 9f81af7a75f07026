//! Client key resolution for rate limiting.

use axum::http::HeaderMap;

/// Key shared by every caller that carries no usable address header.
pub const UNKNOWN_CLIENT: &str = "unknown";

pub const FORWARDED_FOR: &str = "x-forwarded-for";
pub const REAL_IP: &str = "x-real-ip";

/// Derives the rate limit key for a request from its address headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientKeyResolver;

impl ClientKeyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the client key. Never fails; falls back to [`UNKNOWN_CLIENT`].
    pub fn resolve(&self, headers: &HeaderMap) -> String {
        if let Some(forwarded) = header_str(headers, FORWARDED_FOR) {
            // split always yields at least one item
            let first = forwarded.split(',').next().unwrap_or_default();
            return first.trim().to_string();
        }

        if let Some(real_ip) = header_str(headers, REAL_IP) {
            return real_ip.to_string();
        }

        UNKNOWN_CLIENT.to_string()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}
