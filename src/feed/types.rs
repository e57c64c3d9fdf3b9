//! Feed types for bookfeed.

use serde::Serialize;

/// A feed entry after RSS2.0 / Atom normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    /// Item title (empty when absent).
    pub title: String,
    /// Item URL (empty when absent).
    pub link: String,
    /// Publish date exactly as found in the source.
    pub published_at: String,
    /// Item body, preferring encoded content over the plain description.
    pub description: String,
}

/// Which schema a document was normalized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// RSS 2.0 `rss.channel.item`.
    Rss,
    /// Atom `feed.entry`.
    Atom,
    /// Neither schema matched.
    #[default]
    None,
}

impl ParseMode {
    /// Get the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Rss => "rss",
            ParseMode::Atom => "atom",
            ParseMode::None => "none",
        }
    }
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of normalizing one document.
///
/// Parsing never fails: structural problems leave `items` empty with
/// mode [`ParseMode::None`] and describe the problem in `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedFeed {
    /// Schema that matched.
    pub mode: ParseMode,
    /// Normalized items.
    pub items: Vec<FeedItem>,
    /// Parse or upstream problem, if any.
    pub error: Option<String>,
}

impl NormalizedFeed {
    /// An empty result with the given problem description.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            mode: ParseMode::None,
            items: Vec::new(),
            error: Some(error.into()),
        }
    }
}
