use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::models::{FilterOption, HomeSection, PaginationState, VideoSummary};
use crate::pagination;
use crate::profile::{Field, SiteProfile};

static MARKUP_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r]+|<[^>]*>").unwrap());
static CATEGORY_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"category-([a-z-]+)").unwrap());
static FILTER_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"filter=([^&]+)").unwrap());

/// The sort orders every listing supports, used when the page omits its own
/// sort control.
pub const CANONICAL_FILTERS: [(&str, &str); 5] = [
    ("Latest videos", "latest"),
    ("Most viewed videos", "most-viewed"),
    ("Longest videos", "longest"),
    ("Popular videos", "popular"),
    ("Random videos", "random"),
];

pub const DEFAULT_FILTER: &str = "latest";

/// How a tile's `category` is filled in.
#[derive(Debug, Clone, Copy)]
pub enum CategoryRule<'a> {
    /// Every tile gets this label (category page heading, home section title)
    Named(&'a str),
    /// Search results: `category-<slug>` class on the tile, else the
    /// profile's search label. Titles may fall back to the anchor title.
    ClassPattern,
    /// Related videos carry no category
    Empty,
}

/// Per-request inputs that shape extraction.
#[derive(Debug, Clone, Copy)]
pub struct ListingContext<'a> {
    pub requested_filter: Option<&'a str>,
    /// Listing URL used to synthesize fallback filter links
    pub filter_base: Option<&'a Url>,
}

/// Normalized listing page.
#[derive(Debug, Clone)]
pub struct Listing {
    pub category_name: String,
    pub videos: Vec<VideoSummary>,
    pub pagination: PaginationState,
    pub filters: Vec<FilterOption>,
    /// Tiles skipped for missing a required field
    pub dropped: usize,
}

// ============================================================================
// Field Helpers
// ============================================================================

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn read_field(item: ElementRef, chain: &[Field]) -> String {
    chain
        .iter()
        .find_map(|field| {
            let value = match field {
                Field::Text(sel) => item.select(sel).next().map(text_of),
                Field::Attr(sel, name) => item
                    .select(sel)
                    .next()
                    .and_then(|e| e.value().attr(name))
                    .map(|v| v.trim().to_string()),
                Field::Own(name) => item.value().attr(name).map(|v| v.trim().to_string()),
            };
            value.filter(|v| !v.is_empty())
        })
        .unwrap_or_default()
}

/// Same fallback chain, evaluated against the whole document.
pub(crate) fn read_document_field(document: &Html, chain: &[Field]) -> String {
    read_field(document.root_element(), chain)
}

/// Duration text with icon markup, line breaks and padding removed.
pub fn clean_duration(raw: &str) -> String {
    let stripped = MARKUP_NOISE.replace_all(raw, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Tiles
// ============================================================================

fn summary_from(item: ElementRef, profile: &SiteProfile, rule: CategoryRule) -> Option<VideoSummary> {
    let id = read_field(item, &profile.id);
    let title_chain = match rule {
        CategoryRule::ClassPattern => &profile.search_title,
        _ => &profile.title,
    };
    let title = read_field(item, title_chain);
    let thumbnail = read_field(item, &profile.thumbnail);
    let link = read_field(item, &profile.link);

    if id.is_empty() || title.is_empty() || thumbnail.is_empty() || link.is_empty() {
        return None;
    }

    let duration = item
        .select(&profile.duration)
        .next()
        .map(|e| clean_duration(&e.text().collect::<String>()))
        .unwrap_or_default();
    let hd = item.select(&profile.hd_marker).next().is_some();

    let category = match rule {
        CategoryRule::Named(name) => name.to_string(),
        CategoryRule::ClassPattern => item
            .value()
            .attr("class")
            .and_then(|class| CATEGORY_CLASS.captures(class))
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| profile.search_category_label.to_string()),
        CategoryRule::Empty => String::new(),
    };

    Some(VideoSummary {
        id,
        title,
        thumbnail,
        duration,
        hd,
        link,
        category,
    })
}

/// Extracts every valid tile matched by `item_selector` under `scope`.
/// Returns the kept records and how many were dropped.
pub(crate) fn summaries_in(
    scope: ElementRef,
    item_selector: &Selector,
    profile: &SiteProfile,
    rule: CategoryRule,
) -> (Vec<VideoSummary>, usize) {
    let mut videos = Vec::new();
    let mut dropped = 0;
    for item in scope.select(item_selector) {
        match summary_from(item, profile, rule) {
            Some(v) => videos.push(v),
            None => dropped += 1,
        }
    }
    (videos, dropped)
}

/// Extracts listing tiles from a full page.
pub fn extract_summaries(markup: &str, profile: &SiteProfile, rule: CategoryRule) -> Vec<VideoSummary> {
    let document = Html::parse_document(markup);
    summaries_in(document.root_element(), &profile.listing_item, profile, rule).0
}

// ============================================================================
// Page Context
// ============================================================================

fn category_name(document: &Html, profile: &SiteProfile) -> String {
    profile
        .category_heading
        .iter()
        .filter_map(|sel| document.select(sel).next().map(text_of))
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| profile.default_category_name.to_string())
}

fn filter_value(href: &str) -> String {
    FILTER_PARAM
        .captures(href)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn filter_link(base: &Url, value: &str) -> String {
    let mut url = pagination::first_page_url(base);
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "filter")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("filter", value);
    url.to_string()
}

/// Reads the sort control. Never returns an empty list: when the page has no
/// sort options the canonical set is returned with the requested (or default)
/// ordering active.
pub fn extract_filters(document: &Html, profile: &SiteProfile, ctx: &ListingContext) -> Vec<FilterOption> {
    let requested = ctx.requested_filter.filter(|f| !f.is_empty());

    let mut filters: Vec<FilterOption> = document
        .select(&profile.filter_anchor)
        .filter_map(|a| {
            let label = text_of(a);
            if label.is_empty() {
                return None;
            }
            let href = a.value().attr("href").unwrap_or_default();
            let marked = a.value().classes().any(|c| c == "active");
            let requested_match = requested
                .map(|f| href.contains(&format!("filter={}", f)))
                .unwrap_or(false);
            Some(FilterOption {
                label,
                value: filter_value(href),
                url: Some(href.to_string()).filter(|h| !h.is_empty()),
                is_active: marked || requested_match,
            })
        })
        .collect();

    if filters.is_empty() {
        let active = requested.unwrap_or(DEFAULT_FILTER);
        filters = CANONICAL_FILTERS
            .iter()
            .map(|(label, value)| FilterOption {
                label: label.to_string(),
                value: value.to_string(),
                url: ctx.filter_base.map(|base| filter_link(base, value)),
                is_active: *value == active,
            })
            .collect();
    }
    filters
}

/// Full listing extraction: tiles, pagination and sort options.
///
/// A page with zero valid tiles is a valid empty result with a single page.
pub fn extract_listing(
    markup: &str,
    profile: &SiteProfile,
    rule: CategoryRule,
    ctx: &ListingContext,
) -> Listing {
    let document = Html::parse_document(markup);
    let category_name = category_name(&document, profile);

    // Category pages label every tile with the page heading
    let rule = match rule {
        CategoryRule::Named("") => CategoryRule::Named(category_name.as_str()),
        other => other,
    };
    let (videos, dropped) = summaries_in(document.root_element(), &profile.listing_item, profile, rule);

    let pagination = if videos.is_empty() {
        PaginationState::single()
    } else {
        pagination::resolve_in(&document, profile)
    };
    let filters = extract_filters(&document, profile, ctx);

    Listing {
        category_name,
        videos,
        pagination,
        filters,
        dropped,
    }
}

/// Home-page widget blocks, in profile order. Blocks without a valid tile
/// are omitted.
pub fn extract_home(markup: &str, profile: &SiteProfile) -> (Vec<HomeSection>, usize) {
    let document = Html::parse_document(markup);
    let mut sections = Vec::new();
    let mut dropped = 0;

    for block_sel in &profile.home_blocks {
        for block in document.select(block_sel) {
            let title = block.select(&profile.home_heading).next().map(text_of).unwrap_or_default();
            let more_link = block
                .select(&profile.home_more_link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default()
                .to_string();

            let label = profile.home_category.unwrap_or(title.as_str());
            let (videos, skipped) = summaries_in(block, &profile.block_item, profile, CategoryRule::Named(label));
            dropped += skipped;

            if !videos.is_empty() {
                sections.push(HomeSection {
                    title,
                    videos,
                    more_link,
                });
            }
        }
    }
    (sections, dropped)
}
