use async_trait::async_trait;
use crate::application::errors::StoreError;
use crate::domain::entities::{NewMessage, StoredMessage};

/// Append-only message log
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Append a message and return its new id. Not idempotent.
    async fn insert(&self, message: &NewMessage) -> Result<i64, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<StoredMessage>, StoreError>;

    /// Latest messages of a chat, newest first
    async fn recent(&self, chat_id: &str, limit: usize) -> Result<Vec<StoredMessage>, StoreError>;
}
