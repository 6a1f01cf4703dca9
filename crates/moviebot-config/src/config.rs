use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::credentials::CredentialStore;
use crate::paths::PathManager;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} is not configured (set {env} or add `{key}` to credentials.toml)")]
    MissingCredential {
        name: &'static str,
        env: &'static str,
        key: &'static str,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Region used first when listing streaming providers
    #[serde(default = "default_region")]
    pub default_region: String,
    #[serde(default = "default_results_limit")]
    pub results_limit: usize,
    /// Long-poll wait passed to getUpdates
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_max_concurrent_updates")]
    pub max_concurrent_updates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Defaults to `<data dir>/moviebot.db`
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_region() -> String {
    "UZ".to_string()
}

fn default_results_limit() -> usize {
    5
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_updates() -> usize {
    8
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            results_limit: default_results_limit(),
            poll_timeout_secs: default_poll_timeout_secs(),
            max_concurrent_updates: default_max_concurrent_updates(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Like `load_from_file`, but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let region = &self.bot.default_region;
        if region.len() != 2 || !region.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid(format!(
                "default_region must be a two-letter region code, got {:?}",
                region
            )));
        }
        if self.tmdb.timeout_secs == 0 {
            return Err(ConfigError::Invalid("tmdb.timeout_secs must be positive".to_string()));
        }
        if self.bot.results_limit == 0 || self.bot.results_limit > 10 {
            return Err(ConfigError::Invalid("bot.results_limit must be between 1 and 10".to_string()));
        }
        if self.bot.max_concurrent_updates == 0 {
            return Err(ConfigError::Invalid("bot.max_concurrent_updates must be positive".to_string()));
        }
        if self.tmdb.base_url.is_empty() {
            return Err(ConfigError::Invalid("tmdb.base_url cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Effective runtime settings: config file, secrets file and environment merged.
///
/// Environment variables take precedence over both files.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub bot_token: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub db_path: PathBuf,
}

impl Settings {
    pub fn load(paths: &PathManager) -> anyhow::Result<Self> {
        let config = Config::load_or_default(&paths.config_file())?;
        let mut creds = CredentialStore::new(paths.credentials_file());
        creds.load()?;
        let settings = Self::resolve(config, &creds, paths, |key| std::env::var(key).ok());
        settings.config.validate()?;
        Ok(settings)
    }

    pub fn resolve<F>(mut config: Config, creds: &CredentialStore, paths: &PathManager, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = non_empty(env("BOT_TOKEN")).or_else(|| non_empty(creds.get_bot_token().cloned()));
        let tmdb_api_key =
            non_empty(env("TMDB_API_KEY")).or_else(|| non_empty(creds.get_tmdb_api_key().cloned()));

        if let Some(region) = non_empty(env("DEFAULT_REGION")) {
            config.bot.default_region = region;
        }
        config.bot.default_region = config.bot.default_region.trim().to_uppercase();

        let db_path = non_empty(env("DB_PATH"))
            .map(PathBuf::from)
            .or_else(|| config.storage.db_path.clone())
            .unwrap_or_else(|| paths.database_file());

        Self {
            config,
            bot_token,
            tmdb_api_key,
            db_path,
        }
    }

    pub fn require_tmdb_api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb_api_key.as_deref().ok_or(ConfigError::MissingCredential {
            name: "TMDB API key",
            env: "TMDB_API_KEY",
            key: "tmdb_api_key",
        })
    }

    pub fn require_bot_token(&self) -> Result<&str, ConfigError> {
        self.bot_token.as_deref().ok_or(ConfigError::MissingCredential {
            name: "Telegram bot token",
            env: "BOT_TOKEN",
            key: "bot_token",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.bot.default_region = "DE".to_string();
        config.tmdb.timeout_secs = 5;

        let path = file.path().to_path_buf();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.bot.default_region, "DE");
        assert_eq!(loaded.tmdb.timeout_secs, 5);
        assert_eq!(loaded.bot.results_limit, 5);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[bot]\ndefault_region = \"US\"\n").unwrap();
        assert_eq!(config.bot.default_region, "US");
        assert_eq!(config.tmdb.timeout_secs, 15);
        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert!(config.storage.db_path.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.bot.default_region, "UZ");
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.bot.default_region = "USA".to_string();
        assert!(config.validate().is_err());

        config.bot.default_region = "US".to_string();
        config.tmdb.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.tmdb.timeout_secs = 15;
        config.bot.results_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides_files() {
        let paths = PathManager::with_base(PathBuf::from("/srv/bot"));
        let mut creds = CredentialStore::new(PathBuf::from("/srv/bot/credentials.toml"));
        creds.set_tmdb_api_key("from-file".to_string());
        creds.set_bot_token("file-token".to_string());

        let env = env_from(&[
            ("TMDB_API_KEY", "from-env"),
            ("DEFAULT_REGION", " us "),
            ("DB_PATH", "/tmp/bot.db"),
        ]);
        let settings = Settings::resolve(Config::default(), &creds, &paths, env);

        assert_eq!(settings.tmdb_api_key.as_deref(), Some("from-env"));
        assert_eq!(settings.bot_token.as_deref(), Some("file-token"));
        assert_eq!(settings.config.bot.default_region, "US");
        assert_eq!(settings.db_path, PathBuf::from("/tmp/bot.db"));
    }

    #[test]
    fn test_missing_credentials_are_reported() {
        let paths = PathManager::with_base(PathBuf::from("/srv/bot"));
        let creds = CredentialStore::new(PathBuf::from("/srv/bot/credentials.toml"));
        let env = env_from(&[("BOT_TOKEN", "   ")]);
        let settings = Settings::resolve(Config::default(), &creds, &paths, env);

        assert_eq!(settings.db_path, PathBuf::from("/srv/bot/data/moviebot.db"));
        assert!(settings.require_bot_token().is_err());
        let err = settings.require_tmdb_api_key().unwrap_err();
        assert!(err.to_string().contains("TMDB_API_KEY"));
    }
}
