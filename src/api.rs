use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::aggregator::{Aggregator, SearchRequest};
use crate::error::ApiError;
use crate::models::{
    CategoryResponse, ErrorBody, FilterOption, HomeSection, SearchResponse, VideoDetail, VideoSummary,
};
use crate::profile::Site;
use crate::token;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingParams {
    /// Opaque token of the upstream category URL
    pub data: Option<String>,
    /// Legacy raw upstream URL; answered with a redirect to the token form
    pub url: Option<String>,
    /// 1-based page number (default 1)
    pub page: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Search text
    pub q: Option<String>,
    pub page: Option<String>,
    /// Sort order, e.g. `latest`
    pub filter: Option<String>,
    /// `avtub` (default) or `korea`
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DetailParams {
    pub data: Option<String>,
    pub url: Option<String>,
}

enum Target {
    Token(Url),
    Legacy(Url),
}

fn parse_page(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(1),
        Some(p) => p
            .parse::<u32>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid page parameter: {}", p))),
    }
}

fn target_of(data: Option<&str>, url: Option<&str>) -> Result<Target, ApiError> {
    if let Some(data) = data.filter(|d| !d.trim().is_empty()) {
        return Ok(Target::Token(token::decode(data)?));
    }
    if let Some(raw) = url.map(str::trim).filter(|u| !u.is_empty()) {
        let parsed = Url::parse(raw).map_err(|e| ApiError::bad_request(format!("Invalid url parameter: {}", e)))?;
        return Ok(Target::Legacy(parsed));
    }
    Err(ApiError::bad_request("Data/URL parameter is required"))
}

/// Rewrites a legacy `?url=` link into its durable token form.
fn legacy_redirect(path: &str, target: &Url, page: Option<u32>) -> Response {
    let mut location = format!("{}?data={}", path, token::encode(target.as_str()));
    if let Some(page) = page {
        location.push_str(&format!("&page={}", page));
    }
    tracing::info!(%target, %location, "canonicalizing legacy url parameter");
    Redirect::permanent(&location).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/category",
    params(ListingParams),
    responses(
        (status = 200, description = "Normalized category listing", body = CategoryResponse),
        (status = 308, description = "Legacy url parameter, redirected to the token form"),
        (status = 400, description = "Missing or undecodable parameter", body = ErrorBody),
        (status = 500, description = "Upstream fetch failed", body = ErrorBody)
    ),
    tag = "listing"
)]
pub async fn category(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingParams>,
) -> Result<Response, ApiError> {
    let page = parse_page(params.page.as_deref())?;
    let target = match target_of(params.data.as_deref(), params.url.as_deref())? {
        Target::Token(url) => url,
        Target::Legacy(url) => return Ok(legacy_redirect("/api/category", &url, Some(page))),
    };

    let resp = state.aggregator.category(&target, page).await?;
    Ok(Json(resp).into_response())
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Normalized search results", body = SearchResponse),
        (status = 400, description = "Missing search query", body = ErrorBody),
        (status = 500, description = "Upstream fetch failed", body = ErrorBody)
    ),
    tag = "listing"
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Search query (q) is required"))?;
    let req = SearchRequest {
        query,
        page: parse_page(params.page.as_deref())?,
        filter: params.filter,
        site: Site::from_domain(params.domain.as_deref()),
    };

    Ok(Json(state.aggregator.search(&req).await?))
}

#[utoipa::path(
    get,
    path = "/api/video-detail",
    params(DetailParams),
    responses(
        (status = 200, description = "Normalized video detail", body = VideoDetail),
        (status = 308, description = "Legacy url parameter, redirected to the token form"),
        (status = 400, description = "Missing or undecodable parameter", body = ErrorBody),
        (status = 500, description = "Upstream fetch failed", body = ErrorBody)
    ),
    tag = "detail"
)]
pub async fn video_detail(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DetailParams>,
) -> Result<Response, ApiError> {
    let target = match target_of(params.data.as_deref(), params.url.as_deref())? {
        Target::Token(url) => url,
        Target::Legacy(url) => return Ok(legacy_redirect("/api/video-detail", &url, None)),
    };

    let detail = state.aggregator.detail(&target).await?;
    Ok(Json(detail).into_response())
}

#[utoipa::path(
    get,
    path = "/api/videos",
    responses(
        (status = 200, description = "Home-page tiles of the primary site", body = Vec<VideoSummary>),
        (status = 500, description = "Upstream fetch failed", body = ErrorBody)
    ),
    tag = "home"
)]
pub async fn home_videos(State(state): State<Arc<AppState>>) -> Result<Json<Vec<VideoSummary>>, ApiError> {
    Ok(Json(state.aggregator.home_videos().await?))
}

#[utoipa::path(
    get,
    path = "/api/korea-home",
    responses(
        (status = 200, description = "Home-page sections of the korea site", body = Vec<HomeSection>),
        (status = 500, description = "Upstream fetch failed", body = ErrorBody)
    ),
    tag = "home"
)]
pub async fn korea_home(State(state): State<Arc<AppState>>) -> Result<Json<Vec<HomeSection>>, ApiError> {
    Ok(Json(state.aggregator.home(Site::Korea).await?))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

// ============================================================================
// Router
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(category, search, video_detail, home_videos, korea_home),
    components(schemas(
        CategoryResponse,
        SearchResponse,
        VideoDetail,
        VideoSummary,
        FilterOption,
        HomeSection,
        ErrorBody
    )),
    tags(
        (name = "listing", description = "Category and search listings"),
        (name = "detail", description = "Video detail pages"),
        (name = "home", description = "Home-page sections")
    )
)]
pub struct ApiDoc;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/category", get(category).fallback(method_not_allowed))
        .route("/api/search", get(search).fallback(method_not_allowed))
        .route("/api/video-detail", get(video_detail).fallback(method_not_allowed))
        .route("/api/videos", get(home_videos).fallback(method_not_allowed))
        .route("/api/korea-home", get(korea_home).fallback(method_not_allowed))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
