use serde::{Deserialize, Serialize};

/// Sender name stored when the platform does not tell us who wrote a message
pub const UNKNOWN_USER: &str = "unknown";

/// A message as delivered by a platform adapter, before any routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: String,
    pub user: Option<String>,
    /// `None` for media-only messages
    pub text: Option<String>,
    /// Epoch seconds at receipt
    pub timestamp: i64,
}

impl InboundMessage {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            user: None,
            text: Some(text.into()),
            timestamp,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// The text, if there is any that is not whitespace
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Sender name, falling back to [`UNKNOWN_USER`]
    pub fn user_or_unknown(&self) -> &str {
        self.user
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(UNKNOWN_USER)
    }
}

/// A row about to be appended to the message store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    pub chat_id: String,
    pub user: String,
    pub text: String,
    pub timestamp: i64,
}

impl NewMessage {
    /// Build the row for `inbound`, storing `text` rather than the raw body
    pub fn from_inbound(inbound: &InboundMessage, text: impl Into<String>) -> Self {
        Self {
            chat_id: inbound.chat_id.clone(),
            user: inbound.user_or_unknown().to_string(),
            text: text.into(),
            timestamp: inbound.timestamp,
        }
    }
}

/// A persisted message with its store-assigned id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub chat_id: String,
    pub user: String,
    pub text: String,
    pub timestamp: i64,
}
