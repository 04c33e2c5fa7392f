//! Orchestrator timing configuration from TOML (`[orchestrator]` section)

use relay_application::config::{
    DEFAULT_AUXILIARY_DELAY, DEFAULT_BATCH_SPACING, DEFAULT_IDLE_TIMEOUT, OrchestratorConfig,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw orchestrator configuration.
///
/// ```toml
/// [orchestrator]
/// idle_timeout_secs = 30
/// auxiliary_delay_ms = 100
/// batch_spacing_ms = 500
/// auxiliary_query_prefix = "Extract any address: "
/// history_limit = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    pub idle_timeout_secs: u64,
    pub auxiliary_delay_ms: u64,
    pub batch_spacing_ms: u64,
    pub auxiliary_query_prefix: Option<String>,
    pub history_limit: usize,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT.as_secs(),
            auxiliary_delay_ms: DEFAULT_AUXILIARY_DELAY.as_millis() as u64,
            batch_spacing_ms: DEFAULT_BATCH_SPACING.as_millis() as u64,
            auxiliary_query_prefix: None,
            history_limit: 100,
        }
    }
}

impl FileOrchestratorConfig {
    /// Apply these values on top of `base`.
    pub fn apply_to(&self, base: OrchestratorConfig) -> OrchestratorConfig {
        let config = base
            .with_idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .with_auxiliary_delay(Duration::from_millis(self.auxiliary_delay_ms))
            .with_batch_spacing(Duration::from_millis(self.batch_spacing_ms))
            .with_history_limit(self.history_limit);
        match &self.auxiliary_query_prefix {
            Some(prefix) => config.with_auxiliary_query_prefix(prefix.clone()),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_application_defaults() {
        let config = FileOrchestratorConfig::default().apply_to(OrchestratorConfig::default());
        let defaults = OrchestratorConfig::default();
        assert_eq!(config.idle_timeout, defaults.idle_timeout);
        assert_eq!(config.auxiliary_delay, defaults.auxiliary_delay);
        assert_eq!(config.batch_spacing, defaults.batch_spacing);
        assert_eq!(config.auxiliary_query_prefix, defaults.auxiliary_query_prefix);
    }

    #[test]
    fn test_prefix_override() {
        let file = FileOrchestratorConfig {
            auxiliary_query_prefix: Some("Addr: ".to_string()),
            idle_timeout_secs: 5,
            ..Default::default()
        };
        let config = file.apply_to(OrchestratorConfig::default());
        assert_eq!(config.auxiliary_query_prefix, "Addr: ");
        assert_eq!(config.idle_timeout, Duration::from_secs(5));
    }
}
