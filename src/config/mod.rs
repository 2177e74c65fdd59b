//! Configuration module for Review-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use review_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Collecting up to {} reviews per source", config.collector.target);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CollectorConfig, Config, OutputConfig, SourceConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
