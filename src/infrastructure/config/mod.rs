//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub ai: AiConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    /// Telegram bot token
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Send every stored message to the ingest endpoint
    pub ingest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    Sqlite,
    Supabase,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// SQLite database file
    pub path: PathBuf,
    pub supabase: SupabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub key: Option<String>,
    pub table: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "relay-bot".to_string(),
            token: None,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
            ingest: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: PathBuf::from("data/messages.db"),
            supabase: SupabaseConfig::default(),
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            table: "messages".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config {}: {}", path.display(), e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Defaults, then the YAML file if it exists, then `.env` and the
    /// process environment.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::Parse(format!("Failed to read .env: {}", e)));
            }
        }

        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from environment-style variables found by `lookup`
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = var("BOT_TOKEN") {
            self.bot.token = Some(token);
        }
        if let Some(name) = var("BOT_NAME") {
            self.bot.name = name;
        }

        if let Some(url) = var("AI_SERVICE_URL") {
            self.ai.base_url = Some(url);
        }
        if let Some(secs) = var("AI_TIMEOUT_SECS") {
            self.ai.timeout_secs = secs
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("AI_TIMEOUT_SECS must be a number, got {:?}", secs)))?;
        }
        if let Some(flag) = var("AI_INGEST") {
            self.ai.ingest = parse_bool("AI_INGEST", &flag)?;
        }

        if let Some(path) = var("DATABASE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if let Some(url) = var("SUPABASE_URL") {
            // A Supabase URL in the environment selects that backend unless
            // STORAGE_BACKEND says otherwise.
            self.storage.supabase.url = Some(url);
            self.storage.backend = StorageBackend::Supabase;
        }
        if let Some(key) = var("SUPABASE_KEY") {
            self.storage.supabase.key = Some(key);
        }
        if let Some(table) = var("SUPABASE_TABLE") {
            self.storage.supabase.table = table;
        }
        if let Some(backend) = var("STORAGE_BACKEND") {
            self.storage.backend = match backend.trim().to_ascii_lowercase().as_str() {
                "sqlite" => StorageBackend::Sqlite,
                "supabase" => StorageBackend::Supabase,
                other => {
                    return Err(ConfigError::InvalidValue(format!(
                        "STORAGE_BACKEND must be sqlite or supabase, got {:?}",
                        other
                    )))
                }
            };
        }

        Ok(())
    }

    /// Check required values. The token is only needed for Telegram.
    pub fn validate(&self, console: bool) -> Result<(), ConfigError> {
        if !console && self.bot.token.is_none() {
            return Err(ConfigError::MissingField("BOT_TOKEN (bot.token)".to_string()));
        }

        match self.ai.base_url.as_deref() {
            None => return Err(ConfigError::MissingField("AI_SERVICE_URL (ai.base-url)".to_string())),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(ConfigError::InvalidValue(format!("AI service URL must be http(s): {}", url)));
            }
            Some(_) => {}
        }

        if self.ai.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("ai.timeout-secs must be greater than zero".to_string()));
        }

        if self.storage.backend == StorageBackend::Supabase {
            if self.storage.supabase.url.is_none() {
                return Err(ConfigError::MissingField("SUPABASE_URL (storage.supabase.url)".to_string()));
            }
            if self.storage.supabase.key.is_none() {
                return Err(ConfigError::MissingField("SUPABASE_KEY (storage.supabase.key)".to_string()));
            }
        }

        Ok(())
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai.timeout_secs)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!("{} must be a boolean, got {:?}", key, value))),
    }
}
