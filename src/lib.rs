//! Herbar: a polite herb-record harvester
//!
//! This crate crawls a single wiki-style category index, extracts a
//! structured herb record from every member article, resolves each record's
//! primary image to its final asset URL, and hands back a deterministic,
//! deduplicated collection for downstream display.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod model;
pub mod output;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for Herbar operations
#[derive(Debug, Error)]
pub enum HerbarError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

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

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// A page fetch that did not yield markup
#[derive(Debug, Error)]
#[error("Failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: FetchCause) -> Self {
        Self {
            url: url.into(),
            cause,
        }
    }

    /// Returns true if a later attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self.cause {
            FetchCause::Status(code) => code == 429 || code >= 500,
            FetchCause::Timeout | FetchCause::Connect(_) => true,
            FetchCause::Network(_) | FetchCause::Body(_) => false,
        }
    }
}

/// Why a fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

/// Failure to obtain or read the crawl policy resource
///
/// Never escapes the rate limiter; the default delay is used instead.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid policy location: {0}")]
    Location(#[from] ::url::ParseError),
}

/// Result type alias for Herbar operations
pub type Result<T> = std::result::Result<T, HerbarError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, PageFetcher};
pub use extract::{normalize_heading, HeadingNormalizer, LinkDiscoverer, RecordExtractor};
pub use model::{Collection, HerbRecord, ImageRef};
pub use crate::url::{record_id, resolve_url};
