use scraper::Html;

use crate::extract::{clean_duration, read_document_field, summaries_in, CategoryRule};
use crate::models::VideoDetail;
use crate::profile::SiteProfile;

/// Extracts a detail page.
///
/// Structured `itemprop` metadata wins over visible text. A page without a
/// player or download link is not an error: those fields stay empty.
pub fn extract_detail(markup: &str, profile: &SiteProfile) -> VideoDetail {
    let document = Html::parse_document(markup);
    let sel = profile.detail;

    let embed_url = document
        .select(&sel.embed)
        .next()
        .and_then(|e| e.value().attr("src"))
        .unwrap_or_default()
        .trim()
        .to_string();

    let download_url = document
        .select(&sel.download)
        .next()
        .and_then(|e| e.value().attr("href"))
        .unwrap_or_default()
        .trim()
        .to_string();

    let tags = document
        .select(&sel.tags)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let mut related_videos = Vec::new();
    let mut dropped = 0;
    for scope in document.select(&sel.related_scope) {
        let (videos, skipped) = summaries_in(scope, &profile.block_item, profile, CategoryRule::Empty);
        related_videos.extend(videos);
        dropped += skipped;
    }
    if dropped > 0 {
        tracing::debug!(dropped, "skipped incomplete related videos");
    }

    VideoDetail {
        title: read_document_field(&document, &sel.title),
        description: read_document_field(&document, &sel.description),
        embed_url,
        download_url,
        thumbnail: read_document_field(&document, &sel.thumbnail),
        upload_date: read_document_field(&document, &sel.upload_date),
        duration: clean_duration(&read_document_field(&document, &sel.duration)),
        tags,
        related_videos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Site;

    const DETAIL: &str = include_str!("../tests/fixtures/detail_avtub.html");
    const DETAIL_BARE: &str = include_str!("../tests/fixtures/detail_bare.html");

    #[test]
    fn test_metadata_fields() {
        let d = extract_detail(DETAIL, Site::Avtub.profile());
        assert_eq!(d.title, "Meta Title");
        assert_eq!(d.description, "Meta description text");
        assert_eq!(d.thumbnail, "https://cdn.avtub.net/thumbs/1001-full.jpg");
        assert_eq!(d.upload_date, "2024-05-01T10:00:00+00:00");
        assert_eq!(d.duration, "PT12M34S");
        assert_eq!(d.embed_url, "https://player.example/embed/abc");
        assert_eq!(d.download_url, "https://dl.example/get/abc");
    }

    #[test]
    fn test_tags_in_document_order() {
        let d = extract_detail(DETAIL, Site::Avtub.profile());
        assert_eq!(d.tags, vec!["indo", "amateur", "indo"]);
    }

    #[test]
    fn test_related_videos_have_no_category() {
        let d = extract_detail(DETAIL, Site::Avtub.profile());
        // the third related tile has no thumbnail and is dropped
        assert_eq!(d.related_videos.len(), 2);
        assert!(d.related_videos.iter().all(|v| v.category.is_empty()));
        assert_eq!(d.related_videos[0].id, "1101");
        assert_eq!(d.related_videos[0].duration, "07:07");
    }

    #[test]
    fn test_visible_text_fallbacks_and_missing_player() {
        let d = extract_detail(DETAIL_BARE, Site::Korea.profile());
        assert_eq!(d.title, "Visible Title");
        assert_eq!(d.description, "Visible description");
        assert_eq!(d.embed_url, "");
        assert_eq!(d.download_url, "");
        assert_eq!(d.thumbnail, "");
        assert!(d.related_videos.is_empty());
    }

    #[test]
    fn test_visible_duration_is_cleaned() {
        let d = extract_detail(DETAIL_BARE, Site::Avtub.profile());
        assert_eq!(d.duration, "Duration: 12:34");
    }

    #[test]
    fn test_empty_markup_yields_empty_detail() {
        let d = extract_detail("", Site::Avtub.profile());
        assert_eq!(d, VideoDetail::default());
    }
}
