use async_trait::async_trait;
use crate::application::errors::AiServiceError;

/// The external inference service
#[async_trait]
pub trait AiService: Send + Sync {
    /// Sentiment label for `text`
    async fn sentiment(&self, text: &str) -> Result<String, AiServiceError>;

    /// Answer to `question` using the history of `chat_id`
    async fn ask(&self, chat_id: &str, question: &str) -> Result<String, AiServiceError>;

    /// Hand a message to the service's vector index
    async fn ingest(&self, chat_id: &str, text: &str) -> Result<(), AiServiceError>;
}
