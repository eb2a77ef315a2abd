use std::sync::Arc;

use crate::application::errors::BotError;
use crate::domain::entities::{Command, InboundMessage, NewMessage};
use crate::domain::traits::{AiService, Bot, MessageStore};

/// Reply sent whenever the AI service fails. Never carries error details.
pub const ERROR_REPLY: &str = "Error processing request.";

/// Routes inbound messages to the store, the AI service and back to the chat
pub struct Router {
    store: Arc<dyn MessageStore>,
    ai: Arc<dyn AiService>,
    bot: Arc<dyn Bot>,
    ingest: bool,
}

impl Router {
    pub fn new(store: Arc<dyn MessageStore>, ai: Arc<dyn AiService>, bot: Arc<dyn Bot>) -> Self {
        Self {
            store,
            ai,
            bot,
            ingest: false,
        }
    }

    /// Also hand every persisted text to the AI service's ingest endpoint
    pub fn with_ingest(mut self, enabled: bool) -> Self {
        self.ingest = enabled;
        self
    }

    /// Handle one inbound message and return the reply that was sent, if any.
    ///
    /// The message is persisted before the AI service is called. Store and
    /// AI failures are logged here; only a failed send is returned.
    pub async fn handle_message(&self, message: InboundMessage) -> Result<Option<String>, BotError> {
        let Some(text) = message.text() else {
            tracing::debug!(chat_id = %message.chat_id, "Skipping message without text");
            return Ok(None);
        };

        let command = Command::classify(text);
        let Some(stored_text) = command.stored_text() else {
            return Ok(None);
        };

        tracing::info!(chat_id = %message.chat_id, action = command.label(), "Processing message");

        self.persist(&message, stored_text).await;

        if self.ingest {
            self.spawn_ingest(&message.chat_id, stored_text);
        }

        let reply = match &command {
            Command::Sentiment(payload) => Some(self.sentiment_reply(payload).await),
            Command::Ask(payload) => Some(self.ask_reply(&message.chat_id, payload).await),
            Command::StoreOnly(_) | Command::Ignore => None,
        };

        if let Some(reply) = &reply {
            self.bot.send_message(&message.chat_id, reply).await?;
        }

        Ok(reply)
    }

    async fn persist(&self, message: &InboundMessage, text: &str) -> Option<i64> {
        let row = NewMessage::from_inbound(message, text);
        match self.store.insert(&row).await {
            Ok(id) => {
                tracing::debug!(chat_id = %row.chat_id, id, store = self.store.name(), "Message stored");
                Some(id)
            }
            Err(e) => {
                tracing::error!(chat_id = %row.chat_id, store = self.store.name(), error = %e, "Failed to store message");
                None
            }
        }
    }

    fn spawn_ingest(&self, chat_id: &str, text: &str) {
        let ai = Arc::clone(&self.ai);
        let chat_id = chat_id.to_string();
        let text = text.to_string();

        tokio::spawn(async move {
            if let Err(e) = ai.ingest(&chat_id, &text).await {
                tracing::warn!(chat_id = %chat_id, error = %e, "Ingest failed");
            }
        });
    }

    async fn sentiment_reply(&self, payload: &str) -> String {
        match self.ai.sentiment(payload).await {
            Ok(label) => format!("Sentiment: {}", label),
            Err(e) => {
                tracing::error!(endpoint = e.endpoint, error = %e, "Sentiment request failed");
                ERROR_REPLY.to_string()
            }
        }
    }

    async fn ask_reply(&self, chat_id: &str, question: &str) -> String {
        match self.ai.ask(chat_id, question).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(chat_id = %chat_id, endpoint = e.endpoint, timeout = e.is_timeout(), error = %e, "Ask request failed");
                ERROR_REPLY.to_string()
            }
        }
    }
}
