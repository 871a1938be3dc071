//! Configuration module for Pressbox
//!
//! Handles loading, parsing, and validating TOML configuration files.
//! Sites listed in the config are seeded into the registry at startup;
//! everything else tunes crawl behavior.

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, FetchConfig, OutputConfig, SiteEntry, UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
