use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Normalized Records
// ============================================================================

/// One listing tile, normalized across upstream sites.
///
/// `id`, `title`, `thumbnail` and `link` are never empty: the extractor drops
/// any tile that lacks one of them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    /// Upstream post identifier
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    /// Display string in the upstream format (e.g. "12:34")
    pub duration: String,
    pub hd: bool,
    /// Absolute detail-page URL
    pub link: String,
    /// Section title, search class slug, or empty for related videos
    pub category: String,
}

/// Everything the detail page exposes. Missing nodes become empty strings.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub title: String,
    pub description: String,
    pub embed_url: String,
    pub download_url: String,
    pub thumbnail: String,
    pub upload_date: String,
    pub duration: String,
    pub tags: Vec<String>,
    pub related_videos: Vec<VideoSummary>,
}

/// A sort-order choice offered by the upstream listing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterOption {
    pub label: String,
    /// Sort-order token, e.g. `latest` or `most-viewed`
    pub value: String,
    /// Upstream href for this ordering, when one is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub is_active: bool,
}

/// Pagination inferred from the upstream page widget.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
    /// Raw upstream hrefs of the Next / Previous links
    pub next_href: Option<String>,
    pub prev_href: Option<String>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::single()
    }
}

impl PaginationState {
    /// The state of a listing that fits on one page.
    pub fn single() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            has_next: false,
            has_prev: false,
            next_href: None,
            prev_href: None,
        }
    }
}

// ============================================================================
// HTTP Response Bodies
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub category_name: String,
    pub videos: Vec<VideoSummary>,
    pub current_page: u32,
    pub total_pages: u32,
    pub next_page_url: Option<String>,
    pub prev_page_url: Option<String>,
    pub filters: Vec<FilterOption>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub search_query: String,
    pub videos: Vec<VideoSummary>,
    pub current_page: u32,
    pub total_pages: u32,
    pub next_page_url: Option<String>,
    pub prev_page_url: Option<String>,
    pub filters: Vec<FilterOption>,
}

/// A titled block of tiles from a site's home page.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HomeSection {
    pub title: String,
    pub videos: Vec<VideoSummary>,
    pub more_link: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_camel_case() {
        let v = VideoSummary {
            id: "42".into(),
            title: "t".into(),
            thumbnail: "https://img/x.jpg".into(),
            duration: "10:00".into(),
            hd: true,
            link: "https://site/v/42".into(),
            category: "c".into(),
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["hd"], true);
        assert_eq!(json["link"], "https://site/v/42");
    }

    #[test]
    fn test_detail_defaults_to_empty_strings() {
        let json = serde_json::to_value(VideoDetail::default()).unwrap();
        assert_eq!(json["embedUrl"], "");
        assert_eq!(json["downloadUrl"], "");
        assert!(json["relatedVideos"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_filter_url_omitted_when_unknown() {
        let f = FilterOption {
            label: "Latest videos".into(),
            value: "latest".into(),
            url: None,
            is_active: true,
        };
        let json = serde_json::to_value(&f).unwrap();
        assert!(json.get("url").is_none());
        assert_eq!(json["isActive"], true);
    }
}
