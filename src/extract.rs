//! Extract feed entries from the rendered page HTML.
//!
//! The page's structural markers (`.stream-tweet` and friends) are an
//! external, versioned contract that can silently break. All knowledge of
//! that markup lives here so the scraping strategy can be swapped without
//! touching the session controller or the sync coordinator.

use crate::item::FeedItem;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Result of one extraction pass over a rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// One or more entries were found.
    Ready(Vec<FeedItem>),
    /// The page carries an explicit empty-timeline marker: the feed is
    /// genuinely empty, not still rendering.
    Empty,
    /// No entries and no empty marker — the page has likely not finished
    /// client-side rendering. Callers decide whether to poll again.
    NotReady,
}

/// Extract all feed entries from raw HTML.
///
/// `base_url` is the feed root used to synthesize canonical entry links when
/// no in-content link is present. Only `url` is mandatory per entry; a
/// missing avatar yields `image_url: None`.
pub fn extract(html: &str, base_url: &str) -> ExtractOutcome {
    let document = Html::parse_document(html);

    let entry_sel = Selector::parse(".stream-tweet").unwrap();
    let entries: Vec<ElementRef> = document.select(&entry_sel).collect();

    if entries.is_empty() {
        let empty_sel = Selector::parse(".empty-timeline, .no-content").unwrap();
        if document.select(&empty_sel).next().is_some() {
            return ExtractOutcome::Empty;
        }
        return ExtractOutcome::NotReady;
    }

    let items = entries
        .iter()
        .map(|entry| extract_entry(entry, base_url))
        .collect();

    ExtractOutcome::Ready(items)
}

fn extract_entry(entry: &ElementRef, base_url: &str) -> FeedItem {
    let name_sel = Selector::parse(".full-name").unwrap();
    let text_sel = Selector::parse(".tweet-text").unwrap();
    let handle_sel = Selector::parse(".screen-name").unwrap();
    let link_sel = Selector::parse(".tweet-text a").unwrap();
    let avatar_sel = Selector::parse(".avatar").unwrap();

    let name = entry
        .select(&name_sel)
        .next()
        .map(text_of)
        .unwrap_or_default();
    let handle = entry
        .select(&handle_sel)
        .next()
        .map(text_of)
        .unwrap_or_default();
    let description = entry
        .select(&text_sel)
        .next()
        .map(text_of)
        .unwrap_or_default();

    // Prefer the explicit in-content link; else synthesize a canonical link
    // from the feed base URL plus the entry's permalink attribute.
    let data_url = entry
        .select(&link_sel)
        .filter_map(|a| a.value().attr("data-url"))
        .map(|s| s.to_string())
        .next();
    let url = data_url
        .unwrap_or_else(|| join_base(base_url, entry.value().attr("href").unwrap_or_default()));

    let image_url = entry
        .select(&avatar_sel)
        .filter_map(|img| img.value().attr("src"))
        .map(normalize_image_url)
        .next();

    FeedItem {
        // Display name, falling back to the short handle when absent.
        title: if name.is_empty() { handle } else { name },
        description,
        image_url,
        url,
    }
}

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Join the feed base URL with a per-entry relative path.
fn join_base(base_url: &str, path: &str) -> String {
    if let Ok(base) = Url::parse(base_url) {
        if let Ok(joined) = base.join(path) {
            return joined.to_string();
        }
    }
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Normalize protocol-relative avatar URLs to absolute `https:` form.
fn normalize_image_url(src: &str) -> String {
    if let Some(rest) = src.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        src.to_string()
    }
}
