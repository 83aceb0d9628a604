//! HTTP client for the speech-to-text batch job API.
//!
//! Authenticates every request with the `API-Subscription-Key` header and
//! treats exactly one status code per call as success. Job-specific calls live
//! in [`api`] behind the [`JobApi`] trait so the lifecycle can be driven by a
//! scripted implementation in tests.

pub mod api;
pub mod error;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use stt_batch_core::BatchConfig;

pub use api::JobApi;
pub use error::JobControlError;

/// Header carrying the API credential.
pub const SUBSCRIPTION_KEY_HEADER: &str = "API-Subscription-Key";

/// HTTP client for the job API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    subscription_key: String,
}

impl ApiClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(
        base_url: impl Into<String>,
        subscription_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, JobControlError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(JobControlError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            subscription_key: subscription_key.into(),
        })
    }

    pub fn from_config(config: &BatchConfig) -> Result<Self, JobControlError> {
        Self::new(
            config.api_url.clone(),
            config.subscription_key.clone(),
            config.http_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(SUBSCRIPTION_KEY_HEADER, self.subscription_key.as_str())
    }

    /// Send `request` and decode its JSON body if the status is `expected`.
    ///
    /// An empty success body decodes as JSON `null`.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        expected: StatusCode,
    ) -> Result<T, JobControlError> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|source| JobControlError::Transport { operation, source })?;

        let status = response.status();
        tracing::info!(operation, status = status.as_u16(), "Job API response");

        let body = response
            .text()
            .await
            .map_err(|source| JobControlError::Transport { operation, source })?;

        if status != expected {
            return Err(JobControlError::UnexpectedStatus {
                operation,
                status: status.as_u16(),
                expected: expected.as_u16(),
                body,
            });
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|source| JobControlError::Decode { operation, source })
    }

    /// POST a JSON body.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
        expected: StatusCode,
    ) -> Result<T, JobControlError> {
        let request = self.client.post(self.build_url(path)).json(body);
        self.execute(operation, request, expected).await
    }

    /// GET without a body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        expected: StatusCode,
    ) -> Result<T, JobControlError> {
        let request = self.client.get(self.build_url(path));
        self.execute(operation, request, expected).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("subscription_key", &"<redacted>")
            .finish()
    }
}
