//! Orchestrator parameters - channel timing and auxiliary query shaping.
//!
//! [`OrchestratorConfig`] groups the static parameters that control how
//! [`ChannelOrchestrator`](crate::orchestration::ChannelOrchestrator) issues
//! channels. The idle timeout lives here too but is applied by the
//! [`RequestRegistry`](crate::lifecycle::RequestRegistry) built from it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default idle timeout, measured from registration.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default head start the primary channel gets over the auxiliary one.
pub const DEFAULT_AUXILIARY_DELAY: Duration = Duration::from_millis(100);

/// Default pause between consecutive batch submissions.
pub const DEFAULT_BATCH_SPACING: Duration = Duration::from_millis(500);

/// Channel orchestration parameters.
///
/// | Field | Used by |
/// |-------|---------|
/// | `idle_timeout` | registry deadline per request |
/// | `auxiliary_delay` | deferred auxiliary submission in `submit` |
/// | `batch_spacing` | `submit_auxiliary_batch` |
/// | `auxiliary_query_prefix` | derived auxiliary query |
/// | `user` / `auxiliary_user` | `user` field of each request |
/// | `history_limit` | result history capacity |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub idle_timeout: Duration,
    pub auxiliary_delay: Duration,
    pub batch_spacing: Duration,
    /// Prepended to the primary content when a turn has no auxiliary content.
    pub auxiliary_query_prefix: String,
    pub user: String,
    /// Falls back to `user` when unset.
    pub auxiliary_user: Option<String>,
    pub history_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            auxiliary_delay: DEFAULT_AUXILIARY_DELAY,
            batch_spacing: DEFAULT_BATCH_SPACING,
            auxiliary_query_prefix: "Auxiliary analysis: ".to_string(),
            user: "dual-relay".to_string(),
            auxiliary_user: None,
            history_limit: 100,
        }
    }
}

impl OrchestratorConfig {
    // ==================== Builder Methods ====================

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_auxiliary_delay(mut self, delay: Duration) -> Self {
        self.auxiliary_delay = delay;
        self
    }

    pub fn with_batch_spacing(mut self, spacing: Duration) -> Self {
        self.batch_spacing = spacing;
        self
    }

    pub fn with_auxiliary_query_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.auxiliary_query_prefix = prefix.into();
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_auxiliary_user(mut self, user: impl Into<String>) -> Self {
        self.auxiliary_user = Some(user.into());
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    // ==================== Derived Values ====================

    /// Query sent on the auxiliary channel for a turn.
    pub fn auxiliary_query(&self, primary: &str, explicit: Option<&str>) -> String {
        match explicit {
            Some(query) => query.to_string(),
            None => format!("{}{}", self.auxiliary_query_prefix, primary),
        }
    }

    pub fn effective_auxiliary_user(&self) -> &str {
        self.auxiliary_user.as_deref().unwrap_or(&self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert_eq!(config.auxiliary_delay, Duration::from_millis(100));
        assert_eq!(config.batch_spacing, Duration::from_millis(500));
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn test_auxiliary_query_derivation() {
        let config = OrchestratorConfig::default().with_auxiliary_query_prefix("Extract: ");
        assert_eq!(config.auxiliary_query("where?", None), "Extract: where?");
        assert_eq!(config.auxiliary_query("where?", Some("custom")), "custom");
    }

    #[test]
    fn test_auxiliary_user_falls_back() {
        let config = OrchestratorConfig::default().with_user("alice");
        assert_eq!(config.effective_auxiliary_user(), "alice");
        let config = config.with_auxiliary_user("bot");
        assert_eq!(config.effective_auxiliary_user(), "bot");
    }
}
