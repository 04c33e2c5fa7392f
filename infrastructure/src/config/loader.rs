//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order.
const PROJECT_FILES: [&str; 2] = ["relay.toml", ".relay.toml"];

/// Prefix of environment overrides, e.g. `RELAY_PRIMARY__API_KEY`.
const ENV_PREFIX: &str = "RELAY_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `RELAY_`-prefixed environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./relay.toml` or `./.relay.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/dual-relay/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path, Self::global_config_path(), Path::new("."))
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(
        config_path: Option<&PathBuf>,
        global_path: Option<PathBuf>,
        project_dir: &Path,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = global_path
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path_in(project_dir) {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/dual-relay/config.toml if set,
    /// otherwise falls back to ~/.config/dual-relay/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("dual-relay").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_path_in(Path::new("."))
    }

    fn project_config_path_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");
        println!("  [ENV  ] {}* variables", ENV_PREFIX);

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./relay.toml or ./.relay.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(!config.auxiliary.enabled);
        assert_eq!(config.orchestrator.idle_timeout_secs, 30);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("dual-relay"));
    }

    #[test]
    fn test_explicit_file_overrides_project_and_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(
            &global,
            "[primary]\napi_base = \"https://global.example\"\nuser = \"global-user\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("relay.toml"),
            "[primary]\napi_base = \"https://project.example\"\n\n[auxiliary]\nenabled = true\n",
        )
        .unwrap();
        let explicit = dir.path().join("explicit.toml");
        fs::write(&explicit, "[orchestrator]\nidle_timeout_secs = 12\n").unwrap();

        let config: FileConfig = ConfigLoader::figment(Some(&explicit), Some(global), dir.path())
            .extract()
            .unwrap();

        assert_eq!(config.primary.api_base, "https://project.example");
        assert_eq!(config.primary.user.as_deref(), Some("global-user"));
        assert!(config.auxiliary.enabled);
        assert_eq!(config.orchestrator.idle_timeout_secs, 12);
        assert_eq!(config.orchestrator.auxiliary_delay_ms, 100);
    }

    #[test]
    fn test_hidden_project_file_is_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".relay.toml"), "[logging]\n").unwrap();
        let found = ConfigLoader::project_config_path_in(dir.path()).unwrap();
        assert!(found.ends_with(".relay.toml"));
    }

    #[test]
    fn test_env_overrides_files() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("relay.toml", "[primary]\napi_key = \"from-file\"\n")?;
            jail.set_env("RELAY_PRIMARY__API_KEY", "from-env");
            jail.set_env("RELAY_ORCHESTRATOR__HISTORY_LIMIT", "7");

            let config: FileConfig = ConfigLoader::figment(None, None, Path::new(".")).extract()?;
            assert_eq!(config.primary.api_key.as_deref(), Some("from-env"));
            assert_eq!(config.orchestrator.history_limit, 7);
            Ok(())
        });
    }
}
