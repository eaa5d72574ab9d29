//! HTTP queue source for queue managers exposing a JSON admin endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{QueueDataSource, QueueSnapshot, SourceError};

/// Polls `{base_url}/queues` for all snapshots and `{base_url}/queues/{name}`
/// for a single one
#[derive(Debug, Clone)]
pub struct HttpQueueSource {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpQueueSource {
    /// Create a source with a 10 second request timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Create a source with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn queues_url(&self) -> String {
        format!("{}/queues", self.base_url)
    }

    /// Single-queue URL with the name percent-encoded as one path segment
    fn queue_url(&self, queue_name: &str) -> Result<reqwest::Url, SourceError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| SourceError::Transport(format!("Invalid source URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Transport(format!("Source URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push("queues")
            .push(queue_name);
        Ok(url)
    }

    async fn get<U: reqwest::IntoUrl>(&self, url: U) -> Result<reqwest::Response, SourceError> {
        self.http_client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))
    }
}

#[async_trait]
impl QueueDataSource for HttpQueueSource {
    async fn get_all_snapshots(&self) -> Result<Vec<QueueSnapshot>, SourceError> {
        let response = self.get(self.queues_url()).await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let snapshots: Vec<QueueSnapshot> = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        tracing::trace!(count = snapshots.len(), "Fetched queue snapshots");
        Ok(snapshots)
    }

    async fn refresh_snapshot(&self, queue_name: &str) -> Result<QueueSnapshot, SourceError> {
        let response = self.get(self.queue_url(queue_name)?).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SourceError::QueueNotFound(queue_name.to_string())),
            status if !status.is_success() => Err(SourceError::Status(status.as_u16())),
            _ => response
                .json()
                .await
                .map_err(|e| SourceError::Decode(e.to_string())),
        }
    }
}
