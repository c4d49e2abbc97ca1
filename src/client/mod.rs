//! Consumer side of the aggregator API: a read-through cache that serves the
//! last good response when a live request fails.

pub mod cache;
pub mod query;
pub mod view;

use reqwest::Url;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{CategoryResponse, SearchResponse, VideoDetail};
use cache::CacheStore;
use query::QueryKey;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cannot build request url {0}")]
    Url(String),

    #[error("api returned status {0}")]
    Status(u16),

    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read-through cache around any fetch that yields a JSON body.
///
/// A fresh body that decodes is stored under the query's cache key. When the
/// fetch or the decode fails, a stored body for the same key is returned
/// instead; with nothing stored the original error surfaces.
#[derive(Clone)]
pub struct ResilientClient {
    store: Arc<dyn CacheStore>,
}

impl ResilientClient {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub async fn load<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, ClientError>>,
    {
        let cache_key = key.cache_key();

        let fresh = match fetch().await {
            Ok(body) => serde_json::from_str::<T>(&body)
                .map(|value| (value, body))
                .map_err(ClientError::from),
            Err(e) => Err(e),
        };

        let err = match fresh {
            Ok((value, body)) => {
                if let Err(e) = self.store.put(&cache_key, &body).await {
                    tracing::warn!(key = %cache_key, error = %e, "failed to store response");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        let cached = match self.store.get(&cache_key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(key = %cache_key, error = %e, "cache lookup failed");
                None
            }
        };

        match cached.map(|body| serde_json::from_str::<T>(&body)) {
            Some(Ok(value)) => {
                tracing::warn!(key = %cache_key, error = %err, "serving cached response after failed request");
                Ok(value)
            }
            Some(Err(e)) => {
                tracing::warn!(key = %cache_key, error = %e, "discarding undecodable cached response");
                Err(err)
            }
            None => Err(err),
        }
    }
}

/// HTTP client for the aggregator API with the stale-on-error cache in front.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    resilient: ResilientClient,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<dyn CacheStore>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base: Url::parse(base_url)?,
            resilient: ResilientClient::new(store),
        })
    }

    async fn fetch_body(&self, key: &QueryKey) -> Result<String, ClientError> {
        let url = self
            .base
            .join(&key.api_path())
            .map_err(|e| ClientError::Url(format!("{}: {}", key.api_path(), e)))?;
        tracing::debug!(%url, "requesting aggregator api");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        Ok(resp.text().await?)
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<T, ClientError> {
        self.resilient.load(key, || self.fetch_body(key)).await
    }

    pub async fn category(&self, token: &str, page: u32) -> Result<CategoryResponse, ClientError> {
        let key = QueryKey::Category {
            token: token.to_string(),
            page,
        };
        self.load(&key).await
    }

    pub async fn search(
        &self,
        query: &str,
        page: u32,
        filter: Option<&str>,
        domain: Option<&str>,
    ) -> Result<SearchResponse, ClientError> {
        self.load(&QueryKey::search(query, page, filter, domain)).await
    }

    pub async fn detail(&self, token: &str) -> Result<VideoDetail, ClientError> {
        self.load(&QueryKey::Detail {
            token: token.to_string(),
        })
        .await
    }
}
