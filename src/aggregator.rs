use reqwest::Url;
use std::sync::Arc;

use crate::detail::extract_detail;
use crate::error::ApiError;
use crate::extract::{extract_home, extract_listing, CategoryRule, Listing, ListingContext};
use crate::fetcher::{PageKind, Upstream};
use crate::models::{CategoryResponse, HomeSection, SearchResponse, VideoDetail, VideoSummary};
use crate::pagination::{build_page_url, build_search_url};
use crate::profile::{Site, SiteProfile};

/// A free-text search against one site.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
    pub filter: Option<String>,
    pub site: Site,
}

/// Routes each query to the right site profile, fetches the page and
/// normalizes it. Holds no per-request state.
#[derive(Clone)]
pub struct Aggregator {
    upstream: Arc<dyn Upstream>,
}

fn resolve_href(page_url: &Url, href: &str) -> String {
    page_url
        .join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

fn log_drops(listing: &Listing, url: &Url) {
    if listing.dropped > 0 {
        tracing::warn!(
            %url,
            kept = listing.videos.len(),
            dropped = listing.dropped,
            "dropped listing records with missing fields"
        );
    }
}

impl Aggregator {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    async fn fetch(
        &self,
        url: &Url,
        profile: &SiteProfile,
        kind: PageKind,
        context: &'static str,
    ) -> Result<String, ApiError> {
        self.upstream
            .fetch(url, profile, kind)
            .await
            .map_err(|e| ApiError::upstream(context, e))
    }

    pub async fn category(&self, target: &Url, page: u32) -> Result<CategoryResponse, ApiError> {
        let profile = Site::from_url(target).profile();
        let url = build_page_url(target, page);
        let html = self
            .fetch(&url, profile, PageKind::Listing, "Failed to fetch category data")
            .await?;

        let requested = target
            .query_pairs()
            .find(|(k, _)| k == "filter")
            .map(|(_, v)| v.into_owned());
        let ctx = ListingContext {
            requested_filter: requested.as_deref(),
            filter_base: Some(target),
        };
        let listing = extract_listing(&html, profile, CategoryRule::Named(""), &ctx);
        log_drops(&listing, &url);

        let p = &listing.pagination;
        let next_page_url = p.has_next.then(|| match &p.next_href {
            Some(href) => resolve_href(&url, href),
            None => build_page_url(target, p.current_page + 1).to_string(),
        });
        let prev_page_url = p.has_prev.then(|| match &p.prev_href {
            Some(href) => resolve_href(&url, href),
            None => build_page_url(target, p.current_page.saturating_sub(1)).to_string(),
        });

        Ok(CategoryResponse {
            category_name: listing.category_name,
            current_page: listing.pagination.current_page,
            total_pages: listing.pagination.total_pages,
            next_page_url,
            prev_page_url,
            videos: listing.videos,
            filters: listing.filters,
        })
    }

    pub async fn search(&self, req: &SearchRequest) -> Result<SearchResponse, ApiError> {
        let profile = req.site.profile();
        let root = profile.base();
        let filter = req.filter.as_deref().filter(|f| !f.is_empty());
        let url = build_search_url(&root, &req.query, req.page, filter);
        let html = self
            .fetch(&url, profile, PageKind::Listing, "Failed to fetch search data")
            .await?;

        let ctx = ListingContext {
            requested_filter: filter,
            filter_base: None,
        };
        let listing = extract_listing(&html, profile, CategoryRule::ClassPattern, &ctx);
        log_drops(&listing, &url);

        let p = &listing.pagination;
        let next_page_url = p.has_next.then(|| match &p.next_href {
            Some(href) => resolve_href(&url, href),
            None => build_search_url(&root, &req.query, p.current_page + 1, filter).to_string(),
        });
        let prev_page_url = p.has_prev.then(|| match &p.prev_href {
            Some(href) => resolve_href(&url, href),
            None => build_search_url(&root, &req.query, p.current_page.saturating_sub(1), filter).to_string(),
        });

        Ok(SearchResponse {
            search_query: req.query.clone(),
            current_page: listing.pagination.current_page,
            total_pages: listing.pagination.total_pages,
            next_page_url,
            prev_page_url,
            videos: listing.videos,
            filters: listing.filters,
        })
    }

    pub async fn detail(&self, target: &Url) -> Result<VideoDetail, ApiError> {
        let profile = Site::from_url(target).profile();
        let html = self
            .fetch(target, profile, PageKind::Detail, "Failed to fetch video details")
            .await?;
        Ok(extract_detail(&html, profile))
    }

    /// Home-page sections of one site.
    pub async fn home(&self, site: Site) -> Result<Vec<HomeSection>, ApiError> {
        let profile = site.profile();
        let url = profile.base();
        let html = self
            .fetch(&url, profile, PageKind::Listing, "Failed to fetch home data")
            .await?;
        let (sections, dropped) = extract_home(&html, profile);
        if dropped > 0 {
            tracing::warn!(site = site.as_str(), dropped, "dropped home records with missing fields");
        }
        Ok(sections)
    }

    /// Every home-page tile of the primary site, in section order.
    pub async fn home_videos(&self) -> Result<Vec<VideoSummary>, ApiError> {
        let sections = self.home(Site::Avtub).await?;
        Ok(sections.into_iter().flat_map(|s| s.videos).collect())
    }
}
