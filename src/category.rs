//! Feed categories.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Publication stage tracked by a feed.
///
/// Each category is bound to a logical feed key (`shinkan` / `kinkan`),
/// its own source URLs and its own temporal admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedCategory {
    /// Recently released titles (`shinkan`).
    RecentRelease,
    /// Announced, not yet released titles (`kinkan`).
    Forthcoming,
}

impl FeedCategory {
    /// Logical feed key used in requests.
    pub fn key(&self) -> &'static str {
        match self {
            FeedCategory::RecentRelease => "shinkan",
            FeedCategory::Forthcoming => "kinkan",
        }
    }

    /// Category tag used in responses.
    pub fn tag(&self) -> &'static str {
        match self {
            FeedCategory::RecentRelease => "recent_release",
            FeedCategory::Forthcoming => "forthcoming",
        }
    }

    /// Resolve a logical feed key. Only exact keys match.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "shinkan" => Some(FeedCategory::RecentRelease),
            "kinkan" => Some(FeedCategory::Forthcoming),
            _ => None,
        }
    }

    /// All categories, in default request order.
    pub fn all() -> &'static [FeedCategory] {
        &[FeedCategory::RecentRelease, FeedCategory::Forthcoming]
    }
}

impl fmt::Display for FeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FeedCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("unknown feed key: {s}"))
    }
}
