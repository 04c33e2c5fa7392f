//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types
//! by [`FileConfig::to_orchestrator_config`].

mod logging;
mod orchestrator;
mod target;

pub use logging::FileLoggingConfig;
pub use orchestrator::FileOrchestratorConfig;
pub use target::{DEFAULT_API_BASE, FileAuxiliaryConfig, FilePrimaryConfig, TargetSettings};

use relay_application::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("orchestrator.idle_timeout_secs cannot be 0")]
    InvalidTimeout,

    #[error("{0}.api_base cannot be empty")]
    EmptyApiBase(&'static str),

    #[error("orchestrator.history_limit cannot be 0")]
    InvalidHistoryLimit,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub primary: FilePrimaryConfig,
    pub auxiliary: FileAuxiliaryConfig,
    pub orchestrator: FileOrchestratorConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.orchestrator.idle_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.orchestrator.history_limit == 0 {
            return Err(ConfigValidationError::InvalidHistoryLimit);
        }
        if self.primary.api_base.trim().is_empty() {
            return Err(ConfigValidationError::EmptyApiBase("primary"));
        }
        if self.auxiliary.enabled
            && let Some(base) = &self.auxiliary.api_base
            && base.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyApiBase("auxiliary"));
        }
        Ok(())
    }

    pub fn primary_target(&self) -> TargetSettings {
        self.primary.target()
    }

    /// Resolved auxiliary target, `None` when `[auxiliary]` is disabled.
    pub fn auxiliary_target(&self) -> Option<TargetSettings> {
        self.auxiliary.target(&self.primary)
    }

    /// Build the orchestrator parameters from `[orchestrator]` and the
    /// configured users.
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = self.orchestrator.apply_to(OrchestratorConfig::default());
        if let Some(user) = &self.primary.user {
            config = config.with_user(user.clone());
        }
        if let Some(user) = self.auxiliary_target().and_then(|t| t.user) {
            config = config.with_auxiliary_user(user);
        }
        config
    }
}
