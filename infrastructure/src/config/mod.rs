//! Configuration file loading for dual-relay
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `RELAY_`-prefixed environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./relay.toml` or `./.relay.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/dual-relay/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_API_BASE, FileAuxiliaryConfig, FileConfig, FileLoggingConfig,
    FileOrchestratorConfig, FilePrimaryConfig, TargetSettings,
};
pub use loader::ConfigLoader;
