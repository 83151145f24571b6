use std::time::Duration;

use async_trait::async_trait;
use quiet_hn_core::{ItemId, ItemProvider, ItemRecord, ProviderError, RankingProvider};
use serde::de::DeserializeOwned;

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Hacker News Firebase API client. One pooled connection set is shared by
/// every clone, so it serves both the ranking and the per-item fetches.
#[derive(Debug, Clone)]
pub struct HackerNewsClient {
    http: reqwest::Client,
    base_url: String,
}

impl HackerNewsClient {
    /// # Errors
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(http, base_url))
    }

    #[must_use]
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn top_stories_url(&self) -> String {
        format!("{}/topstories.json", self.base_url)
    }

    #[must_use]
    pub fn item_url(&self, id: ItemId) -> String {
        format!("{}/item/{id}.json", self.base_url)
    }

    async fn get_json<T>(&self, url: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(format!("GET {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "GET {url} returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response.text().await.map_err(|err| {
            ProviderError::Transport(format!("GET {url} body could not be read: {err}"))
        })?;
        serde_json::from_str(&body).map_err(|err| {
            ProviderError::Transport(format!("GET {url} returned malformed JSON: {err}"))
        })
    }
}

#[async_trait]
impl RankingProvider for HackerNewsClient {
    async fn top(&self) -> Result<Vec<ItemId>, ProviderError> {
        let ids: Vec<ItemId> = self.get_json(&self.top_stories_url()).await?;
        tracing::debug!(count = ids.len(), "loaded top stories");
        Ok(ids)
    }
}

#[async_trait]
impl ItemProvider for HackerNewsClient {
    async fn fetch(&self, id: ItemId) -> Result<ItemRecord, ProviderError> {
        // Unknown ids come back as a literal `null`.
        let record: Option<ItemRecord> = self.get_json(&self.item_url(id)).await?;
        record.ok_or(ProviderError::NotFound(id))
    }
}
