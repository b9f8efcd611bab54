//! Sumi-Fetch: a bounded concurrent multi-URL fetcher
//!
//! This crate fetches a fixed list of URLs once, in parallel, under a global
//! deadline and an optional per-request timeout. Every URL yields exactly one
//! [`FetchResult`], and the returned [`ResultSet`] preserves input order no
//! matter which fetch finished first or failed.

pub mod config;
pub mod fetch;
pub mod output;

use std::fmt;
use thiserror::Error;

/// Main error type for Sumi-Fetch operations
///
/// Per-URL failures never surface here; they are attached to the URL's
/// [`FetchResult`] as a [`FetchError`].
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Why a single fetch failed
#[derive(Debug, Error)]
pub enum FetchError {
    /// Empty or unparsable URL; no network attempt was made
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A global or per-request deadline passed before completion
    #[error("Request timed out")]
    Timeout,

    /// The batch was cancelled by the caller before completion
    #[error("Request canceled")]
    Canceled,

    /// The server answered with something other than 200 OK
    #[error("Bad status code {status_code} for {url}")]
    BadStatus { url: String, status_code: u16 },

    /// DNS, connect, TLS or body-read failure
    #[error("Transport error: {source}")]
    Transport {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    /// Wraps any transport-level failure
    pub fn transport<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Transport {
            source: source.into(),
        }
    }

    /// Returns the kind of this error, for inspection without matching fields
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::InvalidUrl { .. } => FetchErrorKind::InvalidUrl,
            Self::Timeout => FetchErrorKind::Timeout,
            Self::Canceled => FetchErrorKind::Canceled,
            Self::BadStatus { .. } => FetchErrorKind::BadStatus,
            Self::Transport { .. } => FetchErrorKind::Transport,
        }
    }

    /// Returns the HTTP status code for `BadStatus` errors
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::BadStatus { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Field-less tag for each [`FetchError`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FetchErrorKind {
    InvalidUrl,
    Timeout,
    Canceled,
    BadStatus,
    Transport,
}

impl FetchErrorKind {
    /// Returns the kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::Timeout => "timeout",
            Self::Canceled => "canceled",
            Self::BadStatus => "bad_status",
            Self::Transport => "transport",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result type alias for Sumi-Fetch operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, RunConfig};
pub use fetch::{FetchContext, FetchResult, Fetcher, HttpFetcher, Orchestrator, ResultSet};
