//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::entities::{InboundMessage, COMMANDS};
use crate::domain::traits::{Bot, BotInfo, InboundSource};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Seconds a `getUpdates` call may wait for new messages
const POLL_TIMEOUT_SECS: i64 = 30;

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    /// Unix time the message was sent
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Deserialize)]
struct Response<T> {
    result: T,
}

impl User {
    fn handle(&self) -> Option<String> {
        self.username
            .clone()
            .or_else(|| self.first_name.clone())
            .filter(|name| !name.is_empty())
    }
}

impl Update {
    /// Platform-neutral view of the update. `None` for non-message updates.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.message?;
        Some(InboundMessage {
            chat_id: message.chat.id.to_string(),
            user: message.from.as_ref().and_then(User::handle),
            text: message.text,
            timestamp: message.date,
        })
    }
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    api_base: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS as u64 + 30))
            .build()
            .map_err(|e| BotError::Network(e.to_string()))?;

        Ok(Self {
            token: token.into(),
            api_base: API_BASE.to_string(),
            client,
            info: BotInfo {
                id: "unknown".to_string(),
                name: "relay-bot".to_string(),
                username: "relay_bot".to_string(),
            },
        })
    }

    /// Talk to a different Bot API server
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, BotError>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self.client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(BotError::Network(format!("Telegram API error on {}: {} {}", method, status, error)));
        }

        let data: Response<T> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.result)
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let data: BotInfoResponse = self.call("getMe", &serde_json::json!({})).await?;

        self.info = BotInfo {
            id: data.id.to_string(),
            name: data.first_name,
            username: data.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        self.call("getUpdates", &request).await
    }

    /// Offset that acknowledges every update in `updates`
    pub fn get_next_offset(updates: &[Update]) -> Option<i64> {
        updates.iter()
            .map(|u| u.update_id + 1)
            .max()
    }

    /// Register the relay commands with Telegram
    pub async fn register_commands(&self) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Command {
            command: &'static str,
            description: &'static str,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest {
            commands: Vec<Command>,
        }

        let request = SetMyCommandsRequest {
            commands: COMMANDS
                .iter()
                .map(|c| Command { command: c.name, description: c.description })
                .collect(),
        };

        let _: bool = self.call("setMyCommands", &request).await?;

        tracing::info!("Registered bot commands with Telegram");
        Ok(())
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    /// Send a plain-text message. Answers are relayed verbatim, so no parse mode.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
        }

        #[derive(Deserialize)]
        struct MessageResult {
            message_id: i64,
        }

        tracing::debug!("Sending to {}: {}", chat_id, text);

        let sent: MessageResult = self.call("sendMessage", &SendMessageRequest { chat_id, text }).await?;
        tracing::debug!(chat_id, message_id = sent.message_id, "Message sent");
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// Long-polling source of Telegram messages
pub struct TelegramSource {
    adapter: Arc<TelegramAdapter>,
    offset: i64,
    poll_timeout: i64,
    pending: VecDeque<InboundMessage>,
}

impl TelegramSource {
    pub fn new(adapter: Arc<TelegramAdapter>) -> Self {
        Self {
            adapter,
            offset: 0,
            poll_timeout: POLL_TIMEOUT_SECS,
            pending: VecDeque::new(),
        }
    }

    pub fn with_poll_timeout(mut self, seconds: i64) -> Self {
        self.poll_timeout = seconds;
        self
    }
}

#[async_trait]
impl InboundSource for TelegramSource {
    async fn next_event(&mut self) -> Result<Option<InboundMessage>, BotError> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Ok(Some(message));
            }

            let updates = self.adapter.get_updates(self.offset, self.poll_timeout).await?;
            if !updates.is_empty() {
                tracing::info!("Received {} updates", updates.len());
            }
            if let Some(next) = TelegramAdapter::get_next_offset(&updates) {
                self.offset = self.offset.max(next);
            }
            self.pending
                .extend(updates.into_iter().filter_map(Update::into_inbound));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::Json;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    use crate::infrastructure::test_support::serve;

    fn update(value: Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_update_maps_to_inbound_message() {
        let inbound = update(json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": { "id": 5, "username": "alice", "first_name": "Alice" },
                "chat": { "id": -100200 },
                "date": 1_700_000_000,
                "text": "/ask hi"
            }
        }))
        .into_inbound()
        .unwrap();

        assert_eq!(
            inbound,
            InboundMessage::new("-100200", "/ask hi", 1_700_000_000).with_user("alice")
        );
    }

    #[test]
    fn test_user_falls_back_to_first_name_then_unknown() {
        let named = update(json!({
            "update_id": 1,
            "message": { "message_id": 1, "from": { "id": 5, "first_name": "Bob" }, "chat": { "id": 1 }, "date": 0, "text": "x" }
        }));
        assert_eq!(named.into_inbound().unwrap().user.as_deref(), Some("Bob"));

        let anonymous = update(json!({
            "update_id": 2,
            "message": { "message_id": 2, "chat": { "id": 1 }, "date": 0 }
        }))
        .into_inbound()
        .unwrap();
        assert_eq!(anonymous.user, None);
        assert_eq!(anonymous.text, None);
        assert_eq!(anonymous.user_or_unknown(), "unknown");
    }

    #[test]
    fn test_non_message_updates_are_skipped() {
        assert_eq!(update(json!({ "update_id": 3 })).into_inbound(), None);
        assert_eq!(TelegramAdapter::get_next_offset(&[]), None);
    }

    #[tokio::test]
    async fn test_source_polls_and_advances_offset() {
        let offsets = Arc::new(Mutex::new(Vec::<i64>::new()));
        let recorder = offsets.clone();
        let app = axum::Router::new().route(
            "/botTEST/getUpdates",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    let offset = body["offset"].as_i64().unwrap_or_default();
                    recorder.lock().unwrap().push(offset);
                    let result = if offset == 0 {
                        json!([
                            { "update_id": 7, "message": { "message_id": 1, "chat": { "id": 1 }, "date": 11, "text": "one" } },
                            { "update_id": 8 },
                            { "update_id": 9, "message": { "message_id": 2, "chat": { "id": 2 }, "date": 12, "text": "two" } }
                        ])
                    } else {
                        json!([
                            { "update_id": 10, "message": { "message_id": 3, "chat": { "id": 1 }, "date": 13, "text": "three" } }
                        ])
                    };
                    Json(json!({ "ok": true, "result": result }))
                }
            }),
        );
        let base = serve(app).await;
        let adapter = Arc::new(TelegramAdapter::new("TEST").unwrap().with_api_base(base));
        let mut source = TelegramSource::new(adapter).with_poll_timeout(0);

        let mut texts = Vec::new();
        for _ in 0..3 {
            let message = source.next_event().await.unwrap().unwrap();
            texts.push(message.text.unwrap());
        }

        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(*offsets.lock().unwrap(), vec![0, 10]);
    }

    #[tokio::test]
    async fn test_send_message_and_register_commands() {
        let calls = Arc::new(Mutex::new(Vec::<(String, Value)>::new()));
        let send_calls = calls.clone();
        let command_calls = calls.clone();
        let app = axum::Router::new()
            .route(
                "/botTEST/sendMessage",
                post(move |Json(body): Json<Value>| {
                    let calls = send_calls.clone();
                    async move {
                        calls.lock().unwrap().push(("sendMessage".to_string(), body));
                        Json(json!({ "ok": true, "result": { "message_id": 99 } }))
                    }
                }),
            )
            .route(
                "/botTEST/setMyCommands",
                post(move |Json(body): Json<Value>| {
                    let calls = command_calls.clone();
                    async move {
                        calls.lock().unwrap().push(("setMyCommands".to_string(), body));
                        Json(json!({ "ok": true, "result": true }))
                    }
                }),
            );
        let base = serve(app).await;
        let adapter = TelegramAdapter::new("TEST").unwrap().with_api_base(base);

        adapter.send_message("-5", "Sentiment: positive").await.unwrap();
        adapter.register_commands().await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].1, json!({ "chat_id": "-5", "text": "Sentiment: positive" }));
        let names: Vec<_> = calls[1].1["commands"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["command"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["sentiment", "ask"]);
    }

    #[tokio::test]
    async fn test_api_error_is_network_error() {
        let app = axum::Router::new().route(
            "/botTEST/sendMessage",
            post(|| async { (axum::http::StatusCode::FORBIDDEN, "bot was blocked by the user") }),
        );
        let base = serve(app).await;
        let adapter = TelegramAdapter::new("TEST").unwrap().with_api_base(base);

        let err = adapter.send_message("1", "hi").await.unwrap_err();

        assert!(matches!(err, BotError::Network(ref msg) if msg.contains("blocked")), "{err}");
    }
}
