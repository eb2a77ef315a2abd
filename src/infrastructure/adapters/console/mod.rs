//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::application::errors::BotError;
use crate::domain::entities::InboundMessage;
use crate::domain::traits::{Bot, BotInfo, InboundSource};

/// Chat id every console message belongs to
pub const CONSOLE_CHAT_ID: &str = "console";

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "relay-bot".to_string(),
                username: "console".to_string(),
            },
        }
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn send_message(&self, _chat_id: &str, text: &str) -> Result<(), BotError> {
        println!("[BOT] {}", text);
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// Reads one message per input line
pub struct ConsoleSource<R> {
    lines: Lines<R>,
    user: Option<String>,
}

impl ConsoleSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> ConsoleSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            user: std::env::var("USER").ok(),
        }
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> InboundSource for ConsoleSource<R> {
    async fn next_event(&mut self) -> Result<Option<InboundMessage>, BotError> {
        let line = self
            .lines
            .next_line()
            .await
            .map_err(|e| BotError::Internal(format!("Failed to read stdin: {}", e)))?;

        Ok(line.map(|text| InboundMessage {
            chat_id: CONSOLE_CHAT_ID.to_string(),
            user: self.user.clone(),
            text: Some(text),
            timestamp: chrono::Utc::now().timestamp(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_lines_until_eof() {
        let input: &[u8] = b"/ask hi\n\nhello there\n";
        let mut source = ConsoleSource::new(input).with_user(Some("dev".to_string()));

        let first = source.next_event().await.unwrap().unwrap();
        assert_eq!(first.chat_id, CONSOLE_CHAT_ID);
        assert_eq!(first.user.as_deref(), Some("dev"));
        assert_eq!(first.text.as_deref(), Some("/ask hi"));
        assert!(first.timestamp > 0);

        let blank = source.next_event().await.unwrap().unwrap();
        assert_eq!(blank.text(), None);

        let third = source.next_event().await.unwrap().unwrap();
        assert_eq!(third.text(), Some("hello there"));

        assert_eq!(source.next_event().await.unwrap(), None);
    }
}
