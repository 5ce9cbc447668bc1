//! Configuration for stylesheet fetching.

use core::time::Duration;
use std::env;

/// User agent sent when no override is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("css_loader/", env!("CARGO_PKG_VERSION"));

/// Runtime configuration for the resource loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Whole-request timeout in milliseconds
    pub timeout_ms: u64,
    /// `User-Agent` header for HTTP fetches
    pub user_agent: String,
}

impl Default for LoaderConfig {
    #[inline]
    fn default() -> Self {
        Self::new(30_000, DEFAULT_USER_AGENT.to_owned())
    }
}

impl LoaderConfig {
    /// Construct a `LoaderConfig` with explicit values. The timeout is at least 1ms.
    #[inline]
    #[must_use]
    pub const fn new(timeout_ms: u64, user_agent: String) -> Self {
        let timeout = if timeout_ms < 1 { 1 } else { timeout_ms };
        Self {
            timeout_ms: timeout,
            user_agent,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `CSS_LOADER_TIMEOUT_MS`: request timeout in milliseconds (default: 30000)
    /// - `CSS_LOADER_USER_AGENT`: user agent string
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Like [`LoaderConfig::from_env`], reading variables through `lookup`.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout_ms = lookup("CSS_LOADER_TIMEOUT_MS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(30_000);
        let user_agent = lookup("CSS_LOADER_USER_AGENT")
            .filter(|val| !val.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());
        Self::new(timeout_ms, user_agent)
    }

    /// The request timeout as a `Duration`.
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
