//! Configuration module for Herbar
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use herbar::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("herbar.toml")).unwrap();
//! println!("Harvesting {}{}", config.site.base_url, config.site.category_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DuplicateHeadingPolicy, HeadingsConfig, OutputConfig, SiteConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
