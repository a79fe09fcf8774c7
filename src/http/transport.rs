//! Request/response transport underneath [`super::ApiClient`].

use std::time::Duration;

use async_trait::async_trait;

use super::request::{ApiRequest, ApiResponse};
use super::Outcome;
use crate::error::ApiError;

/// Sends one fully prepared request and reports what came back.
///
/// Non-2xx responses are returned as [`ApiError::Http`] with the parsed JSON
/// body (if any); a missing response is a network or timeout error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Base endpoint every request path is resolved against.
    fn base_url(&self) -> &str;

    async fn send(&self, request: &ApiRequest) -> Outcome;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: &ApiRequest) -> Outcome {
        let url = join_url(&self.base_url, request.path());
        let mut builder = self
            .client
            .request(request.method().clone(), url)
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        if status.is_success() {
            Ok(ApiResponse::new(status, headers, body))
        } else {
            Err(ApiError::http(status, serde_json::from_slice(&body).ok()))
        }
    }
}

/// Join a base endpoint and a request path with exactly one slash.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
