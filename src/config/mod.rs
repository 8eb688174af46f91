//! Configuration module for Sitemap-Sweep
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Command-line flags are applied on top by the binary.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! println!("Request timeout: {}s", config.crawler.request_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, load_or_default, parse_config};
pub use validation::validate;
