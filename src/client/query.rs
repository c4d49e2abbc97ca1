use crate::models::FilterOption;

pub const DEFAULT_FILTER: &str = "latest";
pub const DEFAULT_DOMAIN: &str = "avtub";

/// One logical query against the aggregator API. Identifies both the request
/// and the cache slot holding its last good response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKey {
    Category {
        token: String,
        page: u32,
    },
    Search {
        query: String,
        page: u32,
        filter: String,
        domain: String,
    },
    Detail {
        token: String,
    },
}

impl QueryKey {
    pub fn search(query: impl Into<String>, page: u32, filter: Option<&str>, domain: Option<&str>) -> Self {
        QueryKey::Search {
            query: query.into(),
            page,
            filter: filter.filter(|f| !f.is_empty()).unwrap_or(DEFAULT_FILTER).to_string(),
            domain: domain.filter(|d| !d.is_empty()).unwrap_or(DEFAULT_DOMAIN).to_string(),
        }
    }

    pub fn cache_key(&self) -> String {
        match self {
            QueryKey::Category { token, page } => format!("category_{}_{}", token, page),
            QueryKey::Search {
                query,
                page,
                filter,
                domain,
            } => format!("search_{}_{}_{}_{}", query, page, filter, domain),
            QueryKey::Detail { token } => format!("video_detail_{}", token),
        }
    }

    /// Path and query string relative to the API base URL.
    pub fn api_path(&self) -> String {
        match self {
            QueryKey::Category { token, page } => {
                format!("/api/category?data={}&page={}", urlencoding::encode(token), page)
            }
            QueryKey::Search {
                query,
                page,
                filter,
                domain,
            } => format!(
                "/api/search?q={}&page={}&filter={}&domain={}",
                urlencoding::encode(query),
                page,
                urlencoding::encode(filter),
                urlencoding::encode(domain)
            ),
            QueryKey::Detail { token } => format!("/api/video-detail?data={}", urlencoding::encode(token)),
        }
    }
}

/// The option the upstream marked active, else the first one.
pub fn active_filter(filters: &[FilterOption]) -> Option<&FilterOption> {
    filters.iter().find(|f| f.is_active).or_else(|| filters.first())
}
