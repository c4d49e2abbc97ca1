use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use reqwest::Url;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use rust_aggregator::aggregator::Aggregator;
use rust_aggregator::api::{create_router, AppState};
use rust_aggregator::fetcher::{FetchError, PageKind, Upstream};
use rust_aggregator::profile::SiteProfile;
use rust_aggregator::token;

const CATEGORY: &str = include_str!("fixtures/category_avtub.html");
const DETAIL: &str = include_str!("fixtures/detail_avtub.html");
const HOME_KOREA: &str = include_str!("fixtures/home_korea.html");

struct FakeUpstream {
    body: Option<&'static str>,
    requests: Mutex<Vec<String>>,
}

impl FakeUpstream {
    fn serving(body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            body: Some(body),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn down() -> Arc<Self> {
        Arc::new(Self {
            body: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn fetch(&self, url: &Url, _profile: &SiteProfile, _kind: PageKind) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.body {
            Some(body) => Ok(body.to_string()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            }),
        }
    }
}

fn app(upstream: Arc<FakeUpstream>) -> axum::Router {
    create_router(Arc::new(AppState {
        aggregator: Aggregator::new(upstream),
    }))
}

async fn call(upstream: Arc<FakeUpstream>, method: Method, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let resp = app(upstream)
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

#[tokio::test]
async fn test_category_without_target_is_bad_request() {
    let upstream = FakeUpstream::serving(CATEGORY);
    let (status, _, body) = call(upstream.clone(), Method::GET, "/api/category").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Data/URL parameter is required");
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn test_undecodable_token_is_bad_request() {
    let upstream = FakeUpstream::serving(DETAIL);
    let (status, _, body) = call(upstream.clone(), Method::GET, "/api/video-detail?data=%25%25%25").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid data parameter encoding"));
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn test_non_get_is_method_not_allowed() {
    let (status, _, body) = call(FakeUpstream::serving(CATEGORY), Method::POST, "/api/search?q=x").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");
}

#[tokio::test]
async fn test_legacy_url_redirects_without_fetching() {
    let upstream = FakeUpstream::serving(CATEGORY);
    let uri = "/api/category?url=https%3A%2F%2Fwww.avtub.net%2Fcategory%2Fbokep-indo%2F&page=2";
    let (status, headers, _) = call(upstream.clone(), Method::GET, uri).await;

    assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
    let expected = format!(
        "/api/category?data={}&page=2",
        token::encode("https://www.avtub.net/category/bokep-indo/")
    );
    assert_eq!(headers["location"].to_str().unwrap(), expected);
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn test_category_listing() {
    let upstream = FakeUpstream::serving(CATEGORY);
    let data = token::encode("https://www.avtub.net/category/bokep-indo/?filter=latest");
    let (status, _, body) = call(upstream.clone(), Method::GET, &format!("/api/category?data={}", data)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categoryName"], "Bokep Indo");
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPages"], 12);
    assert_eq!(body["videos"].as_array().unwrap().len(), 2);
    assert_eq!(body["videos"][0]["id"], "1001");
    assert!(body["prevPageUrl"].is_null());
    assert_eq!(
        upstream.requests.lock().unwrap().as_slice(),
        ["https://www.avtub.net/category/bokep-indo/?filter=latest".to_string()]
    );
}

#[tokio::test]
async fn test_search_requires_query() {
    let upstream = FakeUpstream::serving(CATEGORY);
    let (status, _, body) = call(upstream.clone(), Method::GET, "/api/search?q=%20&page=1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Search query (q) is required");
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn test_zero_page_is_bad_request() {
    let data = token::encode("https://www.avtub.net/category/bokep-indo/");
    let (status, _, _) = call(
        FakeUpstream::serving(CATEGORY),
        Method::GET,
        &format!("/api/category?data={}&page=0", data),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upstream_failure_is_server_error() {
    let data = token::encode("https://www.avtub.net/video-one/");
    let (status, _, body) = call(FakeUpstream::down(), Method::GET, &format!("/api/video-detail?data={}", data)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch video details");
    assert!(body["details"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_video_detail() {
    let data = token::encode("https://www.avtub.net/video-one/");
    let (status, _, body) = call(
        FakeUpstream::serving(DETAIL),
        Method::GET,
        &format!("/api/video-detail?data={}", data),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Meta Title");
    assert_eq!(body["embedUrl"], "https://player.example/embed/abc");
}

#[tokio::test]
async fn test_korea_home_sections() {
    let (status, _, body) = call(FakeUpstream::serving(HOME_KOREA), Method::GET, "/api/korea-home").await;

    assert_eq!(status, StatusCode::OK);
    let sections = body.as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["title"], "Bokep Korean Sex Terbaru");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (status, _, body) = call(FakeUpstream::serving(CATEGORY), Method::GET, "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/category"].is_object());
}
