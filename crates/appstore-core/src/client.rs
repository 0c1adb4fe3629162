use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::StoreError;
use crate::model::{AppRecord, Category};

/// Where the query dispatcher gets its results from
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Full, unfiltered catalog
    async fn fetch_catalog(&self) -> Result<Vec<AppRecord>, StoreError>;

    /// Backend-side search; matching semantics are the backend's own
    async fn search(&self, query: &str) -> Result<Vec<AppRecord>, StoreError>;
}

/// The assistant the conversation session talks to
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn chat(&self, query: &str) -> Result<String, StoreError>;
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct ChatbotResponse {
    response: String,
}

/// HTTP client for the store's REST API
#[derive(Clone)]
pub struct StoreClient {
    client: Client,
    base_url: String,
}

impl StoreClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StoreError::Transport)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_app(&self, id: &str) -> Result<AppRecord, StoreError> {
        let url = format!("{}/api/apps/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::decode(response).await
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Category>, StoreError> {
        let url = format!("{}/api/categories", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    /// Download link for the app's APK, if one was uploaded
    pub fn download_url(&self, app: &AppRecord) -> Option<String> {
        app.has_apk()
            .then(|| format!("{}/api/apps/{}/download", self.base_url, app.id))
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        // Read the body first so a shape mismatch is reported as a payload error
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl CatalogBackend for StoreClient {
    async fn fetch_catalog(&self) -> Result<Vec<AppRecord>, StoreError> {
        let url = format!("{}/api/apps", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    async fn search(&self, query: &str) -> Result<Vec<AppRecord>, StoreError> {
        let url = format!("{}/api/search", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&QueryRequest { query })
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl AssistantBackend for StoreClient {
    async fn chat(&self, query: &str) -> Result<String, StoreError> {
        let url = format!("{}/api/chatbot", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&QueryRequest { query })
            .send()
            .await?;

        let reply: ChatbotResponse = Self::decode(response).await?;
        Ok(reply.response)
    }
}
