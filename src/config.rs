use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "OUTLET_ATLAS_API_URL";

const APP_DIR: &str = "outlet-atlas";
const LOG_FILE_NAME: &str = "outlets.log";

/// On-disk configuration, `<config dir>/outlet-atlas/config.json`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_url: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_app_dir()?.join("config.json"))
    }

    fn get_app_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join(APP_DIR))
    }
}

/// Values resolved once at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub log_file: PathBuf,
}

impl Settings {
    /// Precedence: command-line flag, then environment, then config file, then default.
    pub fn resolve(
        cli_api_url: Option<String>,
        cli_log_file: Option<PathBuf>,
        config: Config,
    ) -> Result<Self> {
        let env_api_url = std::env::var(API_URL_ENV).ok();
        let api_url = resolve_api_url(cli_api_url, env_api_url, config.api_url);

        let log_file = match cli_log_file.or(config.log_file) {
            Some(path) => path,
            None => Config::get_app_dir()?.join(LOG_FILE_NAME),
        };

        Ok(Self { api_url, log_file })
    }
}

/// First non-blank candidate wins.
pub fn resolve_api_url(
    cli: Option<String>,
    env: Option<String>,
    file: Option<String>,
) -> String {
    [cli, env, file]
        .into_iter()
        .flatten()
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_api_url_defaults_to_localhost() {
        assert_eq!(resolve_api_url(None, None, None), "http://localhost:8000");
    }

    #[test]
    fn test_api_url_precedence() {
        let cli = Some("http://cli:1".to_string());
        let env = Some("http://env:2".to_string());
        let file = Some("http://file:3".to_string());

        assert_eq!(resolve_api_url(cli, env.clone(), file.clone()), "http://cli:1");
        assert_eq!(resolve_api_url(None, env, file.clone()), "http://env:2");
        assert_eq!(resolve_api_url(None, None, file), "http://file:3");
    }

    #[test]
    fn test_blank_env_falls_through() {
        let url = resolve_api_url(None, Some("  ".to_string()), None);
        assert_eq!(url, DEFAULT_API_URL);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_reads_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_url": "https://outlets.example.com", "log_file": "/tmp/o.log"}"#)
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url.as_deref(), Some("https://outlets.example.com"));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/o.log")));
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_explicit_log_file_wins() {
        let config = Config {
            api_url: None,
            log_file: Some(PathBuf::from("/var/log/from-config.log")),
        };
        let settings = Settings::resolve(
            Some("http://cli:1".to_string()),
            Some(PathBuf::from("/tmp/cli.log")),
            config,
        )
        .unwrap();

        assert_eq!(settings.api_url, "http://cli:1");
        assert_eq!(settings.log_file, PathBuf::from("/tmp/cli.log"));
    }
}
