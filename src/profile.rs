//! Per-site selector tables.
//!
//! Both upstream sites run variants of the same video theme, so one
//! extraction algorithm serves both. A [`SiteProfile`] only records where each
//! field lives and which fallbacks to try when the primary node is missing.

use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::Selector;

/// Builds a selector from a literal in this file.
fn css(selector: &str) -> Selector {
    Selector::parse(selector)
        .unwrap_or_else(|e| panic!("built-in selector {selector:?} is invalid: {e:?}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Avtub,
    Korea,
}

impl Site {
    /// Picks the profile for a target URL by its host. Unknown hosts use the
    /// primary site's profile.
    pub fn from_url(url: &Url) -> Self {
        match url.host_str() {
            Some(host) if host == "bokepkorea.tv" || host.ends_with(".bokepkorea.tv") => Site::Korea,
            _ => Site::Avtub,
        }
    }

    /// Picks the profile from the search `domain` selector.
    pub fn from_domain(domain: Option<&str>) -> Self {
        match domain.map(str::trim) {
            Some("korea") => Site::Korea,
            Some("avtub") | Some("") | None => Site::Avtub,
            Some(other) => {
                tracing::debug!(domain = other, "unknown search domain, using avtub");
                Site::Avtub
            }
        }
    }

    pub fn profile(self) -> &'static SiteProfile {
        match self {
            Site::Avtub => &AVTUB,
            Site::Korea => &KOREA,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Site::Avtub => "avtub",
            Site::Korea => "korea",
        }
    }
}

/// Where to read one field, tried in order until a non-empty value appears.
pub enum Field {
    /// Trimmed text of the first descendant matching the selector
    Text(Selector),
    /// Attribute of the first descendant matching the selector
    Attr(Selector, &'static str),
    /// Attribute of the item element itself
    Own(&'static str),
}

pub struct PaginationSelectors {
    pub current: Selector,
    /// Every anchor in the widget (Next / Previous / Last are found by text)
    pub links: Selector,
    /// Numbered page anchors
    pub numbered: Selector,
}

pub struct DetailSelectors {
    pub title: Vec<Field>,
    pub description: Vec<Field>,
    pub thumbnail: Vec<Field>,
    pub upload_date: Vec<Field>,
    pub duration: Vec<Field>,
    pub embed: Selector,
    pub download: Selector,
    pub tags: Selector,
    pub related_scope: Selector,
}

pub struct SiteProfile {
    pub site: Site,
    pub base_url: &'static str,
    pub referer: &'static str,

    // Listing tiles
    pub listing_item: Selector,
    /// Tiles inside a scoped container (home widgets, related videos)
    pub block_item: Selector,
    pub id: Vec<Field>,
    pub title: Vec<Field>,
    /// Title chain for search results, which may only carry the anchor title
    pub search_title: Vec<Field>,
    pub thumbnail: Vec<Field>,
    pub link: Vec<Field>,
    pub duration: Selector,
    pub hd_marker: Selector,

    // Page context
    pub category_heading: Vec<Selector>,
    pub default_category_name: &'static str,
    pub search_category_label: &'static str,
    pub filter_anchor: Selector,
    pub pagination: PaginationSelectors,

    // Home page
    /// Matched in order; each match is one section
    pub home_blocks: Vec<Selector>,
    pub home_heading: Selector,
    pub home_more_link: Selector,
    /// Fixed category for every home tile; `None` uses the section heading
    pub home_category: Option<&'static str>,

    pub detail: &'static DetailSelectors,
}

impl SiteProfile {
    pub fn base(&self) -> Url {
        Url::parse(self.base_url).unwrap_or_else(|e| panic!("built-in base url {:?}: {e}", self.base_url))
    }
}

static DETAIL: Lazy<DetailSelectors> = Lazy::new(|| DetailSelectors {
    title: vec![
        Field::Attr(css("meta[itemprop='name']"), "content"),
        Field::Text(css("h1.entry-title")),
    ],
    description: vec![
        Field::Attr(css("meta[itemprop='description']"), "content"),
        Field::Text(css(".video-description .desc")),
    ],
    thumbnail: vec![
        Field::Attr(css("meta[itemprop='thumbnailUrl']"), "content"),
        Field::Attr(css("meta[property='og:image']"), "content"),
    ],
    upload_date: vec![
        Field::Attr(css("meta[itemprop='uploadDate']"), "content"),
        Field::Attr(css("meta[property='article:published_time']"), "content"),
    ],
    duration: vec![
        Field::Attr(css("meta[itemprop='duration']"), "content"),
        Field::Text(css("#video-about .duration")),
    ],
    embed: css(".responsive-player iframe"),
    download: css("#tracking-url"),
    tags: css(".video-description .desc a"),
    related_scope: css(".under-video-block"),
});

fn pagination() -> PaginationSelectors {
    PaginationSelectors {
        current: css(".pagination .current"),
        links: css(".pagination a"),
        numbered: css(".pagination ul li a"),
    }
}

fn search_title() -> Vec<Field> {
    vec![
        Field::Text(css("header.entry-header span")),
        Field::Attr(css("a"), "title"),
    ]
}

static AVTUB: Lazy<SiteProfile> = Lazy::new(|| SiteProfile {
    site: Site::Avtub,
    base_url: "https://www.avtub.net/",
    referer: "https://www.avtub.net/",
    listing_item: css("article.thumb-block.video-preview-item"),
    block_item: css("article.thumb-block"),
    id: vec![Field::Own("data-post-id")],
    title: vec![Field::Text(css("header.entry-header span"))],
    search_title: search_title(),
    thumbnail: vec![Field::Attr(css("img.video-main-thumb"), "src")],
    link: vec![Field::Attr(css("a"), "href")],
    duration: css("span.duration"),
    hd_marker: css("span.hd-video"),
    category_heading: vec![css("header.page-header h1 span"), css("h1.archive-title")],
    default_category_name: "Kategori",
    search_category_label: "Search Result",
    filter_anchor: css("#filters .filters-options span a"),
    pagination: pagination(),
    home_blocks: vec![css("section.widget_videos_block")],
    home_heading: css("h2.widget-title"),
    home_more_link: css("a.more-videos"),
    home_category: None,
    detail: &DETAIL,
});

// The korea theme lazy-loads thumbnails through data-src.
static KOREA: Lazy<SiteProfile> = Lazy::new(|| SiteProfile {
    site: Site::Korea,
    base_url: "https://bokepkorea.tv/",
    referer: "https://bokepkorea.tv/",
    listing_item: css("article.thumb-block.video-preview-item"),
    block_item: css("article.thumb-block"),
    id: vec![Field::Own("data-post-id")],
    title: vec![Field::Text(css("header.entry-header span"))],
    search_title: search_title(),
    thumbnail: vec![
        Field::Attr(css("img.video-main-thumb"), "src"),
        Field::Attr(css("img.video-main-thumb"), "data-src"),
    ],
    link: vec![Field::Attr(css("a"), "href")],
    duration: css("span.duration"),
    hd_marker: css("span.hd-video"),
    category_heading: vec![css("header.page-header h1 span"), css("h1.archive-title")],
    default_category_name: "Kategori",
    search_category_label: "Search Result",
    filter_anchor: css("#filters .filters-options span a"),
    pagination: pagination(),
    home_blocks: vec![
        css("#widget_videos_block-9"),
        css("#widget_videos_block-11"),
        css("#widget_videos_block-10"),
    ],
    home_heading: css("h2.widget-title"),
    home_more_link: css("a.more-videos"),
    home_category: Some("Korean Amateur"),
    detail: &DETAIL,
});
