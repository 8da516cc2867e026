//! Configuration management for Cadence.
//!
//! Configuration is read from `cadence.toml`, discovered by walking up from
//! the working directory. Every field has a default, so an absent or empty
//! file yields a working configuration.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    CONFIG_FILE_NAME, find_and_load_config, find_and_load_config_from, load_config,
    manifest_version,
};
pub use schema::{BranchRule, BranchSpec, ChannelSpec, Config, PrereleaseSpec};
