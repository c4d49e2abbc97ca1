//! View-level navigation: canonicalizing legacy links and discarding
//! responses that a newer navigation has superseded.

use reqwest::Url;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::query::QueryKey;
use super::{ApiClient, ClientError};
use crate::token;

pub const DEFAULT_CATEGORY_URL: &str = "https://www.avtub.net/category/bokep-indo/?filter=latest";

/// What a view should do with the link it was opened at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Replace the current link with this one before loading anything.
    Redirect(String),
    Fetch(QueryKey),
    /// Nothing to load, e.g. a search view without a query.
    Idle,
}

fn parse_link(link: &str) -> Option<(String, HashMap<String, String>)> {
    let base = Url::parse("http://view.local/").ok()?;
    let url = base.join(link).ok()?;
    let params = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .filter(|(_, v)| !v.trim().is_empty())
        .collect();
    Some((url.path().to_string(), params))
}

fn page_of(params: &HashMap<String, String>) -> u32 {
    params
        .get("page")
        .and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Decides the navigation for an app link such as `/category?data=...&page=2`.
///
/// A token in `data` wins. Otherwise a legacy `url` parameter redirects to the
/// token form first, so no request is ever issued with a raw upstream URL.
pub fn resolve(link: &str) -> Navigation {
    let Some((path, params)) = parse_link(link) else {
        return Navigation::Idle;
    };
    let page = page_of(&params);

    match path.trim_end_matches('/') {
        "/category" => match (params.get("data"), params.get("url")) {
            (Some(data), _) => Navigation::Fetch(QueryKey::Category {
                token: data.clone(),
                page,
            }),
            (None, Some(raw)) => Navigation::Redirect(format!("/category?data={}&page={}", token::encode(raw), page)),
            (None, None) => Navigation::Fetch(QueryKey::Category {
                token: token::encode(DEFAULT_CATEGORY_URL),
                page,
            }),
        },
        "/search" => match params.get("q") {
            Some(q) => Navigation::Fetch(QueryKey::search(
                q.as_str(),
                page,
                params.get("filter").map(String::as_str),
                params.get("domain").map(String::as_str),
            )),
            None => Navigation::Idle,
        },
        "/detailVid" => match (params.get("data"), params.get("url")) {
            (Some(data), _) => Navigation::Fetch(QueryKey::Detail { token: data.clone() }),
            (None, Some(raw)) => Navigation::Redirect(format!("/detailVid?data={}", token::encode(raw))),
            (None, None) => Navigation::Idle,
        },
        _ => Navigation::Idle,
    }
}

/// Ticket issued to one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Monotonic request counter. Only the most recently issued ticket is allowed
/// to update view state.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Debug, PartialEq)]
pub enum ViewOutcome<T> {
    Loaded(T),
    /// A newer navigation started while this one was in flight.
    Superseded,
    Idle,
}

/// Holds the current link of one view and loads it through the API client.
pub struct ViewController {
    client: ApiClient,
    location: Mutex<String>,
    sequence: RequestSequence,
}

impl ViewController {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            location: Mutex::new(String::new()),
            sequence: RequestSequence::default(),
        }
    }

    pub fn location(&self) -> String {
        self.location.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn set_location(&self, link: &str) {
        if let Ok(mut current) = self.location.lock() {
            *current = link.to_string();
        }
    }

    /// Navigates to `link` and loads it. Redirects are followed before any
    /// request goes out; a response that arrives after a newer `open` began
    /// is reported as `Superseded` and not applied.
    pub async fn open<T: DeserializeOwned>(&self, link: &str) -> Result<ViewOutcome<T>, ClientError> {
        let ticket = self.sequence.issue();
        let mut link = link.to_string();

        // A redirect target is always in token form, so one hop suffices.
        for _ in 0..2 {
            self.set_location(&link);
            match resolve(&link) {
                Navigation::Redirect(next) => {
                    tracing::debug!(from = %link, to = %next, "replacing legacy view link");
                    link = next;
                }
                Navigation::Idle => return Ok(ViewOutcome::Idle),
                Navigation::Fetch(key) => {
                    let result = self.client.load::<T>(&key).await;
                    if !self.sequence.is_latest(ticket) {
                        tracing::debug!(link = %link, "discarding superseded response");
                        return Ok(ViewOutcome::Superseded);
                    }
                    return result.map(ViewOutcome::Loaded);
                }
            }
        }
        Ok(ViewOutcome::Idle)
    }
}
