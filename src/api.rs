use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::model::{Outlet, StoredAnswer};

pub const OUTLETS_PATH: &str = "/outlets";
pub const ANSWER_PATH: &str = "/llmresponses";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure or non-2xx status, passed through untouched.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The body arrived but did not have the expected shape.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid base URL '{0}': expected an http:// or https:// URL")]
    InvalidBaseUrl(String),
}

/// The backend as seen by the views.
///
/// `ApiClient` is the real implementation; tests inject scripted doubles.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /outlets`
    async fn outlets(&self) -> Result<Vec<Outlet>, ApiError>;

    /// `GET /llmresponses`
    async fn stored_answer(&self) -> Result<StoredAnswer, ApiError>;

    /// `POST /llmresponses` with the raw query text. The response body is ignored.
    async fn submit_query(&self, query: &str) -> Result<(), ApiError>;
}

/// Shared HTTP client bound to one base URL. No retries, no interceptors.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let parsed =
            Url::parse(base_url).map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");

        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(serde_json::from_str(&body)?)
    }

    /// Returns the raw response body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let text = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(text)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn outlets(&self) -> Result<Vec<Outlet>, ApiError> {
        self.get(OUTLETS_PATH).await
    }

    async fn stored_answer(&self) -> Result<StoredAnswer, ApiError> {
        self.get(ANSWER_PATH).await
    }

    async fn submit_query(&self, query: &str) -> Result<(), ApiError> {
        let body = self.post(ANSWER_PATH, &StoredAnswer::new(query)).await?;
        tracing::debug!(bytes = body.len(), "query accepted");
        Ok(())
    }
}
