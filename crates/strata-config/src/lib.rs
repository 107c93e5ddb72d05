//! Runtime settings for Strata, persisted as `config.ron`.
//!
//! Sections deserialize with defaults so old files keep loading as fields are
//! added, and command-line flags override whatever was read from disk.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, JobsConfig, StreamingSettings, WorldConfig, default_config_dir};
pub use error::ConfigError;
