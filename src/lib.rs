//! Pressbox: a sitemap-driven sports news crawler
//!
//! This crate monitors a registry of sports news sites, discovers new article
//! URLs through their sitemaps, extracts article content under per-host rate
//! limits, and persists each article exactly once keyed by a hash of its
//! canonical URL.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod sitemap;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Pressbox operations
#[derive(Debug, Error)]
pub enum PressboxError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("A crawl is already running")]
    AlreadyRunning,

    #[error("No eligible sites to crawl")]
    NoEligibleSites,

    #[error("Site unreachable at {url}: {message}")]
    UnreachableSite { url: String, message: String },

    #[error("Malformed sitemap at {url}: {message}")]
    MalformedSitemap { url: String, message: String },

    #[error("Extraction failed for {url}: {message}")]
    ExtractionFailed { url: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PressboxError {
    /// Whether this error aborts an entire run.
    ///
    /// Per-unit fetch and parse failures are recorded in the run's error log
    /// and processing continues; only control-plane faults (the article store
    /// itself failing) terminate a run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Storage(_))
    }
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

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Pressbox operations
pub type Result<T> = std::result::Result<T, PressboxError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Orchestrator, StatusSnapshot};
pub use url::{extract_host, normalize_url, CanonicalUrl};
