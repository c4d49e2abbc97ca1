use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;

use crate::config::Settings;
use crate::profile::SiteProfile;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const BROWSER_LANGUAGE: &str = "en-US,en;q=0.9,id;q=0.8";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to upstream failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream {url} answered {status}")]
    Status { url: String, status: u16 },
}

/// Which kind of page is being fetched; detail pages get a fuller browser
/// header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Listing,
    Detail,
}

/// One GET against an upstream site, returning the page markup.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, url: &Url, profile: &SiteProfile, kind: PageKind) -> Result<String, FetchError>;
}

/// reqwest-backed upstream with a bounded timeout and no retries.
#[derive(Clone)]
pub struct UpstreamFetcher {
    client: Client,
    user_agents: Vec<String>,
}

impl UpstreamFetcher {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.upstream_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        let mut user_agents = settings.user_agents.clone();
        if user_agents.is_empty() {
            user_agents.push(DEFAULT_USER_AGENT.to_string());
        }
        Ok(Self { client, user_agents })
    }

    fn user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENT)
    }
}

#[async_trait]
impl Upstream for UpstreamFetcher {
    async fn fetch(&self, url: &Url, profile: &SiteProfile, kind: PageKind) -> Result<String, FetchError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, self.user_agent())
            .header(REFERER, profile.referer);
        if kind == PageKind::Detail {
            request = request
                .header(ACCEPT, BROWSER_ACCEPT)
                .header(ACCEPT_LANGUAGE, BROWSER_LANGUAGE);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = resp.text().await?;
        tracing::debug!(%url, bytes = html.len(), site = profile.site.as_str(), "fetched upstream page");
        Ok(html)
    }
}
