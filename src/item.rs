//! The item shape handed to the panel dataset.

use serde::{Deserialize, Serialize};

/// One feed entry as persisted for the display surface.
///
/// Field names are fixed by the dataset schema contract — the panel reads
/// `title`, `description`, `image_url`, `url` verbatim. Identity is
/// positional within a sync batch; there is no stable cross-sync id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Author display name.
    pub title: String,
    /// Entry body text.
    pub description: String,
    /// Avatar image URL, absolute `https:` form. Optional.
    pub image_url: Option<String>,
    /// Link to the entry. Always non-empty: either the in-content link or
    /// a canonical link synthesized from the feed base URL.
    pub url: String,
}
