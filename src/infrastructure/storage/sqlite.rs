//! SQLite message store

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::application::errors::StoreError;
use crate::domain::entities::{NewMessage, StoredMessage};
use crate::domain::traits::MessageStore;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories.
    /// `:memory:` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        init_tables(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::Task("connection lock poisoned".to_string()))?;
            f(&*conn).map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn init_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            chat_id TEXT NOT NULL,
            user TEXT NOT NULL DEFAULT 'unknown',
            text TEXT NOT NULL,
            timestamp INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id)",
        [],
    )?;

    Ok(())
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        user: row.get(2)?,
        text: row.get(3)?,
        timestamp: row.get(4)?,
    })
}

#[async_trait]
impl MessageStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, message: &NewMessage) -> Result<i64, StoreError> {
        let message = message.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO messages (chat_id, user, text, timestamp) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![message.chat_id, message.user, message.text, message.timestamp],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn get(&self, id: i64) -> Result<Option<StoredMessage>, StoreError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, chat_id, user, text, timestamp FROM messages WHERE id = ?1",
                [id],
                row_to_message,
            )
            .optional()
        })
        .await
    }

    async fn recent(&self, chat_id: &str, limit: usize) -> Result<Vec<StoredMessage>, StoreError> {
        let chat_id = chat_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, user, text, timestamp FROM messages
                 WHERE chat_id = ?1 ORDER BY id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(rusqlite::params![chat_id, limit], row_to_message)?;
            let messages = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(messages)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(chat_id: &str, text: &str, timestamp: i64) -> NewMessage {
        NewMessage {
            chat_id: chat_id.to_string(),
            user: "alice".to_string(),
            text: text.to_string(),
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_insert_then_get_round_trip() {
        let store = SqliteStore::in_memory().unwrap();

        let id = store.insert(&message("42", "I love this", 1_700_000_123)).await.unwrap();
        let stored = store.get(id).await.unwrap().unwrap();

        assert_eq!(
            stored,
            StoredMessage {
                id,
                chat_id: "42".to_string(),
                user: "alice".to_string(),
                text: "I love this".to_string(),
                timestamp: 1_700_000_123,
            }
        );
        assert_eq!(store.get(id + 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_is_not_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let row = message("1", "same", 5);

        let first = store.insert(&row).await.unwrap();
        let second = store.insert(&row).await.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_per_chat() {
        let store = SqliteStore::in_memory().unwrap();
        for (chat, text) in [("a", "one"), ("b", "other"), ("a", "two"), ("a", "three")] {
            store.insert(&message(chat, text, 0)).await.unwrap();
        }

        let recent = store.recent("a", 2).await.unwrap();
        let texts: Vec<_> = recent.iter().map(|m| m.text.as_str()).collect();

        assert_eq!(texts, vec!["three", "two"]);
        assert!(store.recent("missing", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("messages.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(&message("9", "kept", 10)).await.unwrap()
        };

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.get(id).await.unwrap().map(|m| m.text), Some("kept".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_get_unique_ids() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(&message("c", &format!("m{i}"), i)).await.unwrap() })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 16);
    }
}
