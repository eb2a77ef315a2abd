//! Supabase message store over the PostgREST API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::application::errors::StoreError;
use crate::domain::entities::{NewMessage, StoredMessage};
use crate::domain::traits::MessageStore;

pub struct SupabaseStore {
    rest_url: String,
    key: String,
    client: Client,
}

impl SupabaseStore {
    pub fn new(
        project_url: &str,
        key: impl Into<String>,
        table: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            rest_url: format!("{}/rest/v1/{}", project_url.trim_end_matches('/'), table),
            key: key.into(),
            client,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, StoreError> {
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected(format!("status {}: {}", status, body)));
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[derive(serde::Deserialize)]
struct InsertedRow {
    id: i64,
}

#[async_trait]
impl MessageStore for SupabaseStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn insert(&self, message: &NewMessage) -> Result<i64, StoreError> {
        let request = self
            .client
            .post(&self.rest_url)
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(message);

        let rows: Vec<InsertedRow> = self.rows(request).await?;
        rows.first()
            .map(|row| row.id)
            .ok_or_else(|| StoreError::Decode("insert returned no row".to_string()))
    }

    async fn get(&self, id: i64) -> Result<Option<StoredMessage>, StoreError> {
        let request = self.client.get(&self.rest_url).query(&[
            ("select", "id,chat_id,user,text,timestamp".to_string()),
            ("id", format!("eq.{}", id)),
        ]);

        let rows: Vec<StoredMessage> = self.rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn recent(&self, chat_id: &str, limit: usize) -> Result<Vec<StoredMessage>, StoreError> {
        let request = self.client.get(&self.rest_url).query(&[
            ("select", "id,chat_id,user,text,timestamp".to_string()),
            ("chat_id", format!("eq.{}", chat_id)),
            ("order", "id.desc".to_string()),
            ("limit", limit.to_string()),
        ]);

        self.rows(request).await
    }
}
