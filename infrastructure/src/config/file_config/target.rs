//! Upstream target configuration from TOML (`[primary]` and `[auxiliary]`)
//!
//! Example configuration:
//!
//! ```toml
//! [primary]
//! api_base = "https://api.dify.ai/v1"
//! api_key_env = "DIFY_API_KEY"
//! user = "alice"
//!
//! [auxiliary]
//! enabled = true
//! api_key_env = "DIFY_AUX_API_KEY"   # api_base and user fall back to [primary]
//! ```

use serde::{Deserialize, Serialize};

/// Default chat-message API base.
pub const DEFAULT_API_BASE: &str = "https://api.dify.ai/v1";

/// Primary target (`[primary]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePrimaryConfig {
    pub api_base: String,
    /// Inline API key. Prefer `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
    /// End-user identifier sent upstream.
    pub user: Option<String>,
}

impl Default for FilePrimaryConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            api_key_env: None,
            user: None,
        }
    }
}

impl FilePrimaryConfig {
    pub fn target(&self) -> TargetSettings {
        TargetSettings {
            api_base: self.api_base.clone(),
            api_key: resolve_api_key(self.api_key.as_deref(), self.api_key_env.as_deref()),
            user: self.user.clone(),
        }
    }
}

/// Auxiliary target (`[auxiliary]`). Unset fields fall back to `[primary]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuxiliaryConfig {
    pub enabled: bool,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    pub user: Option<String>,
}

impl FileAuxiliaryConfig {
    /// Resolve the auxiliary target, or `None` when disabled.
    pub fn target(&self, primary: &FilePrimaryConfig) -> Option<TargetSettings> {
        if !self.enabled {
            return None;
        }
        let fallback = primary.target();
        let api_key = resolve_api_key(self.api_key.as_deref(), self.api_key_env.as_deref());
        Some(TargetSettings {
            api_base: self.api_base.clone().unwrap_or(fallback.api_base),
            api_key: api_key.or(fallback.api_key),
            user: self.user.clone().or(fallback.user),
        })
    }
}

/// A fully resolved upstream target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSettings {
    pub api_base: String,
    pub api_key: Option<String>,
    pub user: Option<String>,
}

fn resolve_api_key(inline: Option<&str>, env_var: Option<&str>) -> Option<String> {
    if let Some(key) = inline.filter(|k| !k.trim().is_empty()) {
        return Some(key.to_string());
    }
    env_var
        .and_then(|name| std::env::var(name).ok())
        .filter(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_auxiliary_has_no_target() {
        let aux = FileAuxiliaryConfig::default();
        assert!(aux.target(&FilePrimaryConfig::default()).is_none());
    }

    #[test]
    fn test_auxiliary_falls_back_to_primary() {
        let primary = FilePrimaryConfig {
            api_base: "https://primary.example/v1".to_string(),
            api_key: Some("app-primary".to_string()),
            api_key_env: None,
            user: Some("alice".to_string()),
        };
        let aux = FileAuxiliaryConfig {
            enabled: true,
            api_key: Some("app-aux".to_string()),
            ..Default::default()
        };

        let target = aux.target(&primary).unwrap();
        assert_eq!(target.api_base, "https://primary.example/v1");
        assert_eq!(target.api_key.as_deref(), Some("app-aux"));
        assert_eq!(target.user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_inline_key_wins_over_env() {
        let primary = FilePrimaryConfig {
            api_key: Some("inline".to_string()),
            api_key_env: Some("RELAY_TEST_KEY_THAT_IS_NOT_SET".to_string()),
            ..Default::default()
        };
        assert_eq!(primary.target().api_key.as_deref(), Some("inline"));
    }

    #[test]
    fn test_missing_env_key_is_none() {
        let primary = FilePrimaryConfig {
            api_key_env: Some("RELAY_TEST_KEY_THAT_IS_NOT_SET".to_string()),
            ..Default::default()
        };
        assert!(primary.target().api_key.is_none());
    }
}
