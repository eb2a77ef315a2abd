//! Message store backends

pub mod sqlite;
pub mod supabase;

use std::sync::Arc;
use std::time::Duration;

pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

use crate::application::errors::{BotError, ConfigError};
use crate::domain::traits::MessageStore;
use crate::infrastructure::config::{StorageBackend, StorageConfig};

/// Open the backend selected by `config`
pub fn open_store(config: &StorageConfig, timeout: Duration) -> Result<Arc<dyn MessageStore>, BotError> {
    match config.backend {
        StorageBackend::Sqlite => {
            let store = SqliteStore::open(&config.path)?;
            tracing::info!("Database initialized at {}", config.path.display());
            Ok(Arc::new(store))
        }
        StorageBackend::Supabase => {
            let url = config
                .supabase
                .url
                .as_deref()
                .ok_or_else(|| ConfigError::MissingField("SUPABASE_URL".to_string()))?;
            let key = config
                .supabase
                .key
                .clone()
                .ok_or_else(|| ConfigError::MissingField("SUPABASE_KEY".to_string()))?;
            let store = SupabaseStore::new(url, key, &config.supabase.table, timeout)?;
            tracing::info!("Using Supabase table {}", config.supabase.table);
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_sqlite_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            path: dir.path().join("messages.db"),
            ..StorageConfig::default()
        };

        let store = open_store(&config, Duration::from_secs(1)).unwrap();

        assert_eq!(store.name(), "sqlite");
        assert!(dir.path().join("messages.db").exists());
    }

    #[test]
    fn test_supabase_requires_key() {
        let mut config = StorageConfig::default();
        config.backend = StorageBackend::Supabase;
        config.supabase.url = Some("https://x.supabase.co".to_string());

        let err = open_store(&config, Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, BotError::Config(ConfigError::MissingField(_))));

        config.supabase.key = Some("k".to_string());
        assert_eq!(open_store(&config, Duration::from_secs(1)).unwrap().name(), "supabase");
    }
}
