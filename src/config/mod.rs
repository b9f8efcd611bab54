//! Configuration module for Sumi-Fetch
//!
//! Batches are driven by a [`RunConfig`]. The command-line tool can also read
//! one from a TOML file, together with HTTP client settings, the target URLs
//! and the report destination.
//!
//! # Example
//!
//! ```no_run
//! use sumi_fetch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("fetch.toml")).unwrap();
//! let run = config.run_config();
//! println!("Fetching with at most {} workers", run.max_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetchSettings, HttpSettings, OutputConfig, RunConfig, TargetsConfig,
    DEFAULT_GRACE_PERIOD,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate_run_config;
