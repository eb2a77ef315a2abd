use async_trait::async_trait;
use crate::domain::entities::InboundMessage;
use crate::application::errors::BotError;

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Send a message to a chat
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Source of inbound messages (long polling, stdin, ...)
#[async_trait]
pub trait InboundSource: Send {
    /// Wait for the next message. `Ok(None)` means the source is exhausted.
    async fn next_event(&mut self) -> Result<Option<InboundMessage>, BotError>;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
