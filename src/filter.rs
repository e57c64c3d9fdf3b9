//! Category-specific temporal admission.

use chrono::{DateTime, Utc};

use crate::category::FeedCategory;
use crate::datetime::parse_feed_date;
use crate::feed::FeedItem;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// What to do with items whose publish date cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnparsableDatePolicy {
    /// Surface the item anyway (favors recall).
    #[default]
    Admit,
    /// Drop the item.
    Reject,
}

impl UnparsableDatePolicy {
    /// Policy from the `admit_unparsable_dates` config flag.
    pub fn from_flag(admit: bool) -> Self {
        if admit {
            UnparsableDatePolicy::Admit
        } else {
            UnparsableDatePolicy::Reject
        }
    }

    fn admits(&self) -> bool {
        matches!(self, UnparsableDatePolicy::Admit)
    }
}

/// Admission settings for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdmissionPolicy {
    /// Freshness window in days for recent releases. `None` admits all.
    pub days_window: Option<i64>,
    /// Handling of unparsable dates.
    pub unparsable: UnparsableDatePolicy,
}

/// Whether an item is admitted for its category at reference time `now`.
///
/// - Recent releases: with a window, the item's age must lie in
///   `[0, days_window]` days; without one, everything is admitted.
/// - Forthcoming: the publish instant must be strictly after `now`.
///
/// Unparsable dates follow [`AdmissionPolicy::unparsable`] in both cases.
pub fn admits(
    category: FeedCategory,
    item: &FeedItem,
    now: DateTime<Utc>,
    policy: &AdmissionPolicy,
) -> bool {
    match category {
        FeedCategory::RecentRelease => {
            let Some(window) = policy.days_window else {
                return true;
            };
            match parse_feed_date(&item.published_at) {
                Some(published) => {
                    let age_days =
                        (now - published).num_milliseconds() as f64 / MILLIS_PER_DAY;
                    age_days >= 0.0 && age_days <= window as f64
                }
                None => policy.unparsable.admits(),
            }
        }
        FeedCategory::Forthcoming => match parse_feed_date(&item.published_at) {
            Some(published) => published > now,
            None => policy.unparsable.admits(),
        },
    }
}

/// Keep the admitted items, preserving order.
pub fn filter_items(
    category: FeedCategory,
    items: Vec<FeedItem>,
    now: DateTime<Utc>,
    policy: &AdmissionPolicy,
) -> Vec<FeedItem> {
    items
        .into_iter()
        .filter(|item| admits(category, item, now, policy))
        .collect()
}
