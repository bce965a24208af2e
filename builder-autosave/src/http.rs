//! REST document API client.
//!
//! Speaks plain JSON over HTTP: `PUT {base}/documents/{id}` with the snapshot
//! as body, answered by `{success, message?}`, and `GET {base}/documents/{id}`
//! returning the snapshot. Transport failures and 5xx answers are retried
//! with capped exponential backoff.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use builder_core::DocumentSnapshot;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{PersistenceError, PersistenceResult};
use crate::store::{DocumentStore, SaveReceipt};

/// Configuration for retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration with custom values.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay_ms: u64, max_delay_ms: u64, multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            max_delay_ms,
            multiplier,
        }
    }

    /// A configuration that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retrying after the given attempt (0-indexed).
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let base_delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        base_delay.min(self.max_delay_ms as f64).max(0.0) as u64
    }
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Document store backed by a REST API.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    http: Client,
    base: Url,
    token: Option<String>,
    retry: RetryConfig,
}

impl HttpDocumentStore {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidUrl`] if the URL is malformed or
    /// cannot carry a path, and [`PersistenceError::Http`] if the HTTP client
    /// fails to build.
    pub fn new(base_url: impl AsRef<str>) -> PersistenceResult<Self> {
        let base = Url::parse(base_url.as_ref())
            .map_err(|e| PersistenceError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(PersistenceError::InvalidUrl(format!(
                "{base} cannot carry a path"
            )));
        }

        let http = Client::builder()
            .user_agent(concat!("builder-autosave/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base,
            token: None,
            retry: RetryConfig::default(),
        })
    }

    /// Authenticate every request with a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Endpoint for a document id. The id is percent-encoded as one segment.
    #[must_use]
    pub fn document_url(&self, document_id: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("documents").push(document_id);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, mut attempt_once: F) -> PersistenceResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PersistenceResult<T>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match attempt_once().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        "Document {} failed (attempt {}/{}), retrying in {}ms: {}",
                        operation,
                        attempt + 1,
                        max_attempts,
                        delay,
                        error
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn save_once(
        &self,
        document_id: &str,
        snapshot: &DocumentSnapshot,
    ) -> PersistenceResult<SaveReceipt> {
        let request = self.http.put(self.document_url(document_id)).json(snapshot);
        let response = self.authorize(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PersistenceError::NotFound(document_id.to_string()));
        }
        let response = response.error_for_status()?;

        let body = response.text().await?;
        let answer: SaveResponse = serde_json::from_str(&body)
            .map_err(|e| PersistenceError::UnexpectedResponse(e.to_string()))?;
        if !answer.success {
            return Err(PersistenceError::Rejected(
                answer
                    .message
                    .unwrap_or_else(|| "no reason given".to_string()),
            ));
        }

        Ok(SaveReceipt {
            message: answer.message,
            ..SaveReceipt::now(document_id)
        })
    }

    async fn load_once(&self, document_id: &str) -> PersistenceResult<DocumentSnapshot> {
        let request = self.http.get(self.document_url(document_id));
        let response = self.authorize(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PersistenceError::NotFound(document_id.to_string()));
        }
        let body = response.error_for_status()?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn save(
        &self,
        document_id: &str,
        snapshot: &DocumentSnapshot,
    ) -> PersistenceResult<SaveReceipt> {
        let receipt = self
            .with_retry("save", move || self.save_once(document_id, snapshot))
            .await?;
        debug!("Saved document {document_id} via {}", self.base);
        Ok(receipt)
    }

    async fn load(&self, document_id: &str) -> PersistenceResult<DocumentSnapshot> {
        self.with_retry("load", move || self.load_once(document_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_delay_ms, 200);
        assert_eq!(config.max_delay_ms, 5_000);
    }

    #[test]
    fn test_delay_backs_off_and_caps() {
        let config = RetryConfig::new(10, 100, 1_000, 2.0);
        assert_eq!(config.delay_for_attempt(0), 100);
        assert_eq!(config.delay_for_attempt(1), 200);
        assert_eq!(config.delay_for_attempt(3), 800);
        assert_eq!(config.delay_for_attempt(4), 1_000);
        assert_eq!(config.delay_for_attempt(20), 1_000);
    }

    #[test]
    fn test_invalid_url_error() {
        assert!(matches!(
            HttpDocumentStore::new("not-a-valid-url"),
            Err(PersistenceError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpDocumentStore::new("mailto:someone@example.com"),
            Err(PersistenceError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_document_url() {
        let store = HttpDocumentStore::new("https://api.example.com/v1/").expect("valid url");
        assert_eq!(
            store.document_url("post 7").as_str(),
            "https://api.example.com/v1/documents/post%207"
        );

        let store = HttpDocumentStore::new("https://api.example.com").expect("valid url");
        assert_eq!(
            store.document_url("a/b").as_str(),
            "https://api.example.com/documents/a%2Fb"
        );
    }
}
