//! Wallet → basename lookup.
//!
//! The on-chain reverse resolution lives behind an external service; this
//! module only defines the seam and an HTTP client for it.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio_retry::strategy::jitter;
use tokio_retry::{Retry, strategy::ExponentialBackoff};
use tracing::{info, warn};

use crate::errors::MailError;

#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolves a wallet address to its basename (e.g. `alice.base.eth`).
    /// `Ok(None)` means the wallet has no name.
    async fn resolve(&self, wallet: &str) -> Result<Option<String>, MailError>;
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    name: Option<String>,
}

pub struct HttpNameResolver {
    base_url: String,
    http: Client,
}

impl HttpNameResolver {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, MailError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MailError::HttpError(format!("Failed to build resolver client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, MailError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, MailError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);

        Retry::spawn(strategy, operation).await
    }
}

#[async_trait]
impl NameResolver for HttpNameResolver {
    async fn resolve(&self, wallet: &str) -> Result<Option<String>, MailError> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(wallet));

        let name = self
            .with_retry(|| async {
                let resp = self.http.get(&url).send().await?;
                if resp.status() == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !resp.status().is_success() {
                    let status = resp.status();
                    warn!(%status, "Name resolver returned an error");
                    return Err(MailError::HttpError(format!(
                        "name resolver returned status {status}"
                    )));
                }
                let body: ResolveResponse = resp.json().await?;
                Ok(body.name.filter(|n| !n.trim().is_empty()))
            })
            .await?;

        info!(wallet = %wallet, basename = ?name, "Resolved wallet basename");
        Ok(name)
    }
}
