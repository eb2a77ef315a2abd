//! AI service client - JSON over HTTP to the inference service

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::errors::{AiFailure, AiServiceError, BotError};
use crate::domain::traits::AiService;

const SENTIMENT: &str = "sentiment";
const ASK: &str = "ask";
const INGEST: &str = "ingest";
const HEALTH: &str = "health";

/// HTTP client for the inference service
pub struct HttpAiClient {
    base_url: String,
    client: Client,
}

impl HttpAiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Check that the service answers on its root path
    pub async fn health(&self) -> Result<(), AiServiceError> {
        let response = self
            .client
            .get(self.url(""))
            .send()
            .await
            .map_err(|e| AiServiceError::new(HEALTH, e.into()))?;

        check_status(HEALTH, response).await.map(|_| ())
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> Result<reqwest::Response, AiServiceError> {
        tracing::debug!(endpoint, "Calling AI service");

        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| AiServiceError::new(endpoint, e.into()))?;

        check_status(endpoint, response).await
    }

    async fn post_json<B, R>(&self, endpoint: &'static str, body: &B) -> Result<R, AiServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.post(endpoint, body)
            .await?
            .json::<R>()
            .await
            .map_err(|e| AiServiceError::new(endpoint, AiFailure::Decode(e.to_string())))
    }
}

async fn check_status(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AiServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AiServiceError::new(
        endpoint,
        AiFailure::Status {
            status: status.as_u16(),
            body,
        },
    ))
}

#[derive(Serialize)]
struct SentimentRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct SentimentResponse {
    sentiment: String,
}

#[derive(Serialize)]
struct AskRequest<'a> {
    chat_id: &'a str,
    question: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

#[derive(Serialize)]
struct IngestRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[async_trait]
impl AiService for HttpAiClient {
    async fn sentiment(&self, text: &str) -> Result<String, AiServiceError> {
        let response: SentimentResponse = self.post_json(SENTIMENT, &SentimentRequest { text }).await?;
        Ok(response.sentiment)
    }

    async fn ask(&self, chat_id: &str, question: &str) -> Result<String, AiServiceError> {
        let response: AskResponse = self.post_json(ASK, &AskRequest { chat_id, question }).await?;
        Ok(response.answer)
    }

    async fn ingest(&self, chat_id: &str, text: &str) -> Result<(), AiServiceError> {
        self.post(INGEST, &IngestRequest { chat_id, text }).await?;
        Ok(())
    }
}
