//! Configuration module for link-mapper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use link_mapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mapper.toml")).unwrap();
//! println!("Crawling from seed: {}", config.crawler.seed);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, ScopeConfig, UserAgentConfig,
    DEFAULT_CONCURRENT_FETCHES, MAX_CONCURRENT_FETCHES,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
