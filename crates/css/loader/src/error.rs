//! Errors reported by stylesheet acquisition.

use core::fmt::{self, Display, Formatter};
use url::Url;

/// Why a stylesheet could not be fetched or parsed.
///
/// Superseded fetches are not errors; see `LoadOutcome::Superseded`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// The transport failed before a response arrived.
    Network { url: Url, message: String },
    /// The server answered with a non-success status.
    Status { url: Url, status: u16 },
    /// A cross-origin response did not pass the CORS check.
    CorsRejected { url: Url },
    /// No transport exists for the URL scheme.
    UnsupportedScheme { url: Url },
    /// Reading a local file failed.
    Io { url: Url, message: String },
    /// The body could not be turned into a stylesheet.
    Parse { url: Url, message: String },
    /// Fetches were requested outside a tokio runtime.
    NoRuntime,
    /// The fetch task ended abnormally.
    Task(String),
}

impl Display for LoadError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { url, message } => write!(formatter, "failed to fetch {url}: {message}"),
            Self::Status { url, status } => write!(formatter, "failed to fetch {url} (status: {status})"),
            Self::CorsRejected { url } => write!(formatter, "cross-origin response from {url} was rejected"),
            Self::UnsupportedScheme { url } => write!(formatter, "unsupported url scheme {}", url.scheme()),
            Self::Io { url, message } => write!(formatter, "failed to read {url}: {message}"),
            Self::Parse { url, message } => write!(formatter, "failed to parse stylesheet {url}: {message}"),
            Self::NoRuntime => write!(formatter, "no tokio runtime is available for stylesheet fetches"),
            Self::Task(message) => write!(formatter, "stylesheet fetch task failed: {message}"),
        }
    }
}

impl core::error::Error for LoadError {}
