//! Merging, ordering and truncation of scored items.

use std::cmp::Ordering;

use serde::{Serialize, Serializer};

use crate::category::FeedCategory;
use crate::datetime::sort_timestamp;
use crate::feed::FeedItem;

/// Default number of returned items.
pub const DEFAULT_LIMIT: usize = 20;
/// Upper bound on returned items.
pub const MAX_LIMIT: usize = 50;

const ISBN13_LEN: usize = 13;

/// One item of the response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    /// Source category, serialized as its feed key.
    #[serde(rename = "feed", serialize_with = "serialize_feed_key")]
    pub category: FeedCategory,
    pub title: String,
    pub link: String,
    /// Publish date exactly as it appeared in the feed.
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub isbn13: Option<String>,
    pub match_score: f64,
    /// Category tag (`recent_release` / `forthcoming`).
    pub tag: &'static str,
}

fn serialize_feed_key<S>(category: &FeedCategory, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(category.key())
}

impl RankedItem {
    /// Build a response item from a normalized feed item and its score.
    pub fn new(category: FeedCategory, item: FeedItem, match_score: f64) -> Self {
        let isbn13 = extract_isbn13(&item.link);
        Self {
            category,
            title: item.title,
            link: item.link,
            pub_date: item.published_at,
            isbn13,
            match_score,
            tag: category.tag(),
        }
    }
}

/// Trailing 13 digits of a link, ignoring every non-digit character.
///
/// Returns `None` when the link carries fewer than 13 digits.
///
/// ```
/// use bookfeed::rank::extract_isbn13;
///
/// assert_eq!(
///     extract_isbn13("https://www.hanmoto.com/bd/isbn/9784000000001").as_deref(),
///     Some("9784000000001")
/// );
/// assert_eq!(extract_isbn13("https://example.com/item/42"), None);
/// ```
pub fn extract_isbn13(link: &str) -> Option<String> {
    let digits: Vec<char> = link.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < ISBN13_LEN {
        return None;
    }
    Some(digits[digits.len() - ISBN13_LEN..].iter().collect())
}

/// Clamp a requested limit into `[1, MAX_LIMIT]`.
pub fn clamp_limit(requested: i64) -> usize {
    requested.clamp(1, MAX_LIMIT as i64) as usize
}

fn compare(a: &RankedItem, b: &RankedItem) -> Ordering {
    b.match_score
        .total_cmp(&a.match_score)
        .then_with(|| sort_timestamp(&b.pub_date).cmp(&sort_timestamp(&a.pub_date)))
}

/// Order by descending score, then descending publish time (unparsable
/// dates last), and keep at most `limit` items.
pub fn rank(mut items: Vec<RankedItem>, limit: usize) -> Vec<RankedItem> {
    items.sort_by(compare);
    items.truncate(limit);
    items
}
