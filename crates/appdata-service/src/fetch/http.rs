//! Support to fetch collections from the management API over HTTP.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::{Client, StatusCode, Url, header};

use crate::collections::CollectionKind;
use crate::config::HttpSourceConfig;

use super::{FetchResult, Fetcher, USER_AGENT};

/// The number of attempts made for one fetch.
const MAX_ATTEMPTS: usize = 3;

/// Fetcher implementation that requests `<url>/<collection>` from the management API.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

/// A non-success response of the management API.
#[derive(Debug, thiserror::Error)]
#[error("management API returned status {0}")]
struct StatusError(StatusCode);

impl HttpFetcher {
    pub fn new(client: Client, base_url: Url, token: Option<String>) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    /// Creates a fetcher with its own client, configured with the source's timeouts.
    pub fn from_config(config: &HttpSourceConfig) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self::new(client, config.url.clone(), config.token.clone()))
    }

    /// The URL the given collection is requested from.
    pub fn collection_url(&self, kind: CollectionKind) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("`{}` cannot be a base URL", self.base_url))?
            .pop_if_empty()
            .push(kind.as_str());
        Ok(url)
    }

    async fn fetch_json(&self, url: &Url) -> FetchResult {
        let mut request = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            tracing::trace!("Success fetching from management API");
            Ok(response.json().await?)
        } else {
            tracing::warn!("Management API returned status code {}", status);
            Err(StatusError(status).into())
        }
    }

    async fn fetch_collection(&self, kind: CollectionKind) -> FetchResult {
        let url = self.collection_url(kind)?;
        tracing::debug!("Fetching {} from `{}`", kind, url);

        retry(|| self.fetch_json(&url))
            .await
            .with_context(|| format!("failed to fetch `{url}`"))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_categories(&self) -> BoxFuture<'_, FetchResult> {
        Box::pin(self.fetch_collection(CollectionKind::Categories))
    }

    fn fetch_groups(&self) -> BoxFuture<'_, FetchResult> {
        Box::pin(self.fetch_collection(CollectionKind::Groups))
    }

    fn fetch_filters(&self) -> BoxFuture<'_, FetchResult> {
        Box::pin(self.fetch_collection(CollectionKind::Filters))
    }
}

/// Client errors are unlikely to go away on their own, everything else is worth another try.
fn should_retry(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<StatusError>() {
        Some(StatusError(status)) => !status.is_client_error(),
        None => true,
    }
}

async fn retry<G, F, T>(task_gen: G) -> Result<T>
where
    G: Fn() -> F,
    F: Future<Output = Result<T>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        let result = task_gen().await;

        let should_not_retry = match &result {
            Ok(_) => true,
            Err(err) => !should_retry(err),
        };

        if should_not_retry || tries >= MAX_ATTEMPTS {
            break result;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
