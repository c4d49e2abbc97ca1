use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html};

use crate::models::PaginationState;
use crate::profile::SiteProfile;

static PAGE_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/page/(\d+)/").unwrap());

// ============================================================================
// Pre-fetch URL Shaping
// ============================================================================

/// Returns the upstream URL for `page` of the listing at `base`.
///
/// Page 1 is always `base` itself. An existing `/page/<n>/` segment is
/// rewritten in place; otherwise one is appended to the path, keeping the
/// query string intact.
pub fn build_page_url(base: &Url, page: u32) -> Url {
    if page <= 1 {
        return base.clone();
    }

    let path = base.path();
    let mut url = base.clone();
    if PAGE_SEGMENT.is_match(path) {
        let rewritten = PAGE_SEGMENT.replace(path, format!("/page/{}/", page).as_str());
        url.set_path(&rewritten);
    } else {
        let trimmed = path.trim_end_matches('/');
        url.set_path(&format!("{}/page/{}/", trimmed, page));
    }
    tracing::debug!(%base, page, target = %url, "shaped page url");
    url
}

/// Builds a free-text search URL against a site root:
/// `<root>[page/<n>/]?s=<query>[&filter=<filter>]`.
pub fn build_search_url(root: &Url, query: &str, page: u32, filter: Option<&str>) -> Url {
    let mut url = root.clone();
    if page > 1 {
        let trimmed = root.path().trim_end_matches('/');
        url.set_path(&format!("{}/page/{}/", trimmed, page));
    }
    let mut qs = format!("s={}", urlencoding::encode(query));
    if let Some(filter) = filter.filter(|f| !f.is_empty()) {
        qs.push_str("&filter=");
        qs.push_str(&urlencoding::encode(filter));
    }
    url.set_query(Some(&qs));
    url
}

/// Strips any page segment so the URL points at the first page again.
pub fn first_page_url(url: &Url) -> Url {
    let mut first = url.clone();
    let path = PAGE_SEGMENT.replace(url.path(), "/");
    first.set_path(&path);
    first
}

// ============================================================================
// Post-fetch Inference
// ============================================================================

/// Infers pagination from the page widget in `markup`.
pub fn resolve_pagination(markup: &str, profile: &SiteProfile) -> PaginationState {
    let document = Html::parse_document(markup);
    resolve_in(&document, profile)
}

pub(crate) fn resolve_in(document: &Html, profile: &SiteProfile) -> PaginationState {
    let sel = &profile.pagination;

    let current_page = document
        .select(&sel.current)
        .next()
        .and_then(|e| e.text().collect::<String>().trim().parse::<u32>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(1);

    let links: Vec<ElementRef> = document.select(&sel.links).collect();
    let find_link = |label: &str| {
        links
            .iter()
            .find(|a| a.text().collect::<String>().contains(label))
            .copied()
    };

    // "Last" link carries the final page number in its href
    let mut total_pages = find_link("Last")
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| PAGE_SEGMENT.captures(href))
        .and_then(|c| c[1].parse::<u32>().ok())
        .unwrap_or(0);

    if total_pages == 0 {
        total_pages = document
            .select(&sel.numbered)
            .filter_map(|a| a.text().collect::<String>().trim().parse::<u32>().ok())
            .max()
            .unwrap_or(1);
    }
    let total_pages = total_pages.max(current_page).max(1);

    let next = find_link("Next");
    let prev = find_link("Previous");

    let mut state = PaginationState {
        current_page,
        total_pages,
        has_next: next.is_some(),
        has_prev: prev.is_some() || current_page > 1,
        next_href: next.and_then(|a| a.value().attr("href")).map(str::to_string),
        prev_href: prev.and_then(|a| a.value().attr("href")).map(str::to_string),
    };

    if state.total_pages == 1 {
        state = PaginationState::single();
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Site;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_page_one_is_identity() {
        for s in [
            "https://site.example/category/x/?filter=latest",
            "https://site.example/category/x/page/4/",
            "https://site.example/",
        ] {
            assert_eq!(build_page_url(&url(s), 1), url(s));
        }
    }

    #[test]
    fn test_page_segment_inserted_before_query() {
        let base = url("https://site.example/category/x/?filter=latest");
        assert_eq!(
            build_page_url(&base, 3).as_str(),
            "https://site.example/category/x/page/3/?filter=latest"
        );
    }

    #[test]
    fn test_path_without_trailing_slash() {
        let base = url("https://site.example/category/x");
        assert_eq!(
            build_page_url(&base, 2).as_str(),
            "https://site.example/category/x/page/2/"
        );
    }

    #[test]
    fn test_existing_segment_is_rewritten() {
        let base = url("https://site.example/category/x/?filter=popular");
        let twice = build_page_url(&build_page_url(&base, 3), 5);
        assert_eq!(
            twice.as_str(),
            "https://site.example/category/x/page/5/?filter=popular"
        );
        assert_eq!(twice.path().matches("/page/").count(), 1);
    }

    #[test]
    fn test_search_url_first_page() {
        let root = url("https://www.avtub.net/");
        assert_eq!(
            build_search_url(&root, "hello world", 1, None).as_str(),
            "https://www.avtub.net/?s=hello%20world"
        );
    }

    #[test]
    fn test_search_url_with_page_and_filter() {
        let root = url("https://bokepkorea.tv/");
        assert_eq!(
            build_search_url(&root, "abc", 2, Some("most-viewed")).as_str(),
            "https://bokepkorea.tv/page/2/?s=abc&filter=most-viewed"
        );
    }

    #[test]
    fn test_first_page_url_strips_segment() {
        let u = url("https://site.example/category/x/page/7/?filter=latest");
        assert_eq!(
            first_page_url(&u).as_str(),
            "https://site.example/category/x/?filter=latest"
        );
    }

    #[test]
    fn test_resolve_from_last_link() {
        let html = r#"<div class="pagination"><ul>
            <li><a href="/c/x/">1</a></li>
            <li><span class="current">2</span></li>
            <li><a href="/c/x/page/3/">3</a></li>
            <li><a href="/c/x/page/3/">Next</a></li>
            <li><a href="/c/x/page/1/">Previous</a></li>
            <li><a href="/c/x/page/41/">Last</a></li>
        </ul></div>"#;
        let state = resolve_pagination(html, Site::Avtub.profile());
        assert_eq!(state.current_page, 2);
        assert_eq!(state.total_pages, 41);
        assert!(state.has_next);
        assert!(state.has_prev);
        assert_eq!(state.next_href.as_deref(), Some("/c/x/page/3/"));
    }

    #[test]
    fn test_resolve_from_numbered_links() {
        let html = r#"<div class="pagination"><ul>
            <li><span class="current">1</span></li>
            <li><a href="/s/page/2/">2</a></li>
            <li><a href="/s/page/6/">6</a></li>
            <li><a href="/s/page/2/">Next</a></li>
        </ul></div>"#;
        let state = resolve_pagination(html, Site::Korea.profile());
        assert_eq!(state.current_page, 1);
        assert_eq!(state.total_pages, 6);
        assert!(state.has_next);
        assert!(!state.has_prev);
    }

    #[test]
    fn test_resolve_defaults_without_widget() {
        let state = resolve_pagination("<html><body></body></html>", Site::Avtub.profile());
        assert_eq!(state, PaginationState::single());
    }

    #[test]
    fn test_single_page_ignores_stray_links() {
        let html = r#"<div class="pagination"><a href="/x/">Next</a></div>"#;
        let state = resolve_pagination(html, Site::Avtub.profile());
        assert_eq!(state.total_pages, 1);
        assert!(!state.has_next);
        assert!(!state.has_prev);
    }

    #[test]
    fn test_total_never_below_current() {
        let html = r#"<div class="pagination"><ul><li><span class="current">4</span></li></ul></div>"#;
        let state = resolve_pagination(html, Site::Avtub.profile());
        assert_eq!(state.current_page, 4);
        assert_eq!(state.total_pages, 4);
        assert!(state.has_prev);
    }
}
