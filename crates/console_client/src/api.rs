use std::time::Duration;

use chrono::{DateTime, Utc};
use console_core::{CrawlConfig, JobId};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend returned http status {0}")]
    HttpStatus(u16),
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid backend address: {0}")]
    BadAddress(String),
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Acknowledgement returned by both launch and stop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobAck {
    pub job_id: JobId,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductItem {
    pub id: i64,
    pub model: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub brand: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentItem {
    pub id: i64,
    pub url: String,
    pub product_id: Option<i64>,
}

/// One page of a paginated listing endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CleanupOut {
    pub removed: u64,
}

/// Request-response client for the crawl backend.
///
/// Every call is a single exchange; nothing here retries. Launch and stop
/// failures are surfaced once to the operator.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: Url, settings: ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::BadAddress(err.to_string()))
    }

    /// Submits a crawl configuration; the returned job id becomes the
    /// monitoring target.
    pub async fn launch(&self, config: &CrawlConfig) -> Result<JobAck, ApiError> {
        let response = self
            .client
            .post(self.endpoint("crawl")?)
            .json(config)
            .send()
            .await
            .map_err(map_transport)?;
        decode_ok(response).await
    }

    /// Advisory cancellation: success means the request was accepted, not
    /// that the crawl has halted.
    pub async fn stop(&self, job_id: &str) -> Result<JobAck, ApiError> {
        let response = self
            .client
            .post(self.endpoint(&format!("logs/stop/{job_id}"))?)
            .send()
            .await
            .map_err(map_transport)?;
        decode_ok(response).await
    }

    pub async fn products(&self, skip: u64, limit: u64) -> Result<Page<ProductItem>, ApiError> {
        let mut url = self.endpoint("products")?;
        url.query_pairs_mut()
            .append_pair("skip", &skip.to_string())
            .append_pair("limit", &limit.to_string());
        let response = self.client.get(url).send().await.map_err(map_transport)?;
        decode_ok(response).await
    }

    // The documents backend paginates with `offset`, not `skip`.
    pub async fn documents(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Page<DocumentItem>, ApiError> {
        let mut url = self.endpoint("documents")?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());
        let response = self.client.get(url).send().await.map_err(map_transport)?;
        decode_ok(response).await
    }

    /// Triggers server-side product deduplication.
    pub async fn cleanup(&self) -> Result<CleanupOut, ApiError> {
        let response = self
            .client
            .post(self.endpoint("products/cleanup")?)
            .send()
            .await
            .map_err(map_transport)?;
        decode_ok(response).await
    }
}

async fn decode_ok<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::HttpStatus(status.as_u16()));
    }
    response.json().await.map_err(map_transport)
}

fn map_transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Transport(err.to_string())
}
