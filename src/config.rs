use crate::api::DEFAULT_API_URL;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "SNIPPY_CONFIG";

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub user: UserConfig,
    /// Absent means guest mode: everything stays in the local store
    #[serde(default)]
    pub api: Option<ApiConfig>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct UserConfig {
    /// Must match the id the backend's auth reports for the token
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct StorageConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Loads from `$SNIPPY_CONFIG` or the platform config directory, then
    /// applies environment overrides. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => load_config(&path)?,
            _ => Config::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("SNIPPY_USER_ID") {
            self.user.id = Some(id);
        }
        if let Some(url) = lookup("SNIPPY_API_URL") {
            self.api.get_or_insert_with(ApiConfig::default).base_url = url;
        }
        if let Some(token) = lookup("SNIPPY_API_TOKEN") {
            self.api.get_or_insert_with(ApiConfig::default).token = Some(token);
        }
        if let Some(dir) = lookup("SNIPPY_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(api) = &self.api {
            if api.base_url.trim().is_empty() {
                bail!("api.base_url must not be empty");
            }
            if self.user_id().is_none() {
                bail!("user.id is required when [api] is configured");
            }
        }
        Ok(())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn is_guest(&self) -> bool {
        self.api.is_none()
    }

    /// Directory the store and log files live under
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir().context("Failed to get data directory"),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("snippy").join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content).with_context(|| "Failed to parse config file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_is_guest_mode() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.is_guest());
        assert_eq!(config.log.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn api_section_uses_default_url() {
        let config: Config = toml::from_str(
            r#"
            [user]
            id = "user_2abc"

            [api]
            token = "secret"
            "#,
        )
        .unwrap();

        let api = config.api.as_ref().unwrap();
        assert_eq!(api.base_url, "http://localhost:8080/api");
        assert_eq!(api.token.as_deref(), Some("secret"));
        assert_eq!(config.user_id(), Some("user_2abc"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn api_without_user_is_rejected() {
        let config: Config = toml::from_str("[api]\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut config: Config = toml::from_str(
            r#"
            [user]
            id = "from-file"
            [storage]
            data_dir = "/tmp/file"
            "#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("SNIPPY_USER_ID", "from-env"),
            ("SNIPPY_API_URL", "https://snippets.example.com/api"),
            ("SNIPPY_DATA_DIR", "/tmp/env"),
        ]
        .into_iter()
        .collect();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.user_id(), Some("from-env"));
        assert_eq!(
            config.api.unwrap().base_url,
            "https://snippets.example.com/api"
        );
        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/tmp/env")));
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[log]\nlevel = \"debug\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[user\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
