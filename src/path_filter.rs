use regex::Regex;

use crate::error::Result;

/// Framework assets, static images and the favicon bypass the limiter.
pub const DEFAULT_EXCLUDE_PATTERN: &str = r"^/(_next/static|_next/image|favicon\.ico|images/)";

/// Decides which request paths skip rate limiting.
#[derive(Debug, Clone)]
pub struct PathFilter {
    exclude: Option<Regex>,
}

impl PathFilter {
    /// Build a filter from a regex; an empty pattern excludes nothing.
    pub fn new(pattern: &str) -> Result<Self> {
        let exclude = if pattern.is_empty() {
            None
        } else {
            Some(Regex::new(pattern)?)
        };
        Ok(Self { exclude })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(path))
    }

    pub fn pattern(&self) -> Option<&str> {
        self.exclude.as_ref().map(Regex::as_str)
    }
}
