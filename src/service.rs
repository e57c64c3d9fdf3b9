//! Request flow for the supplement endpoint.
//!
//! Resolves every requested category, filters and scores the items,
//! ranks the merged set and optionally attaches a diagnostic trace.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use tokio::task::AbortHandle;
use tracing::info;

use crate::category::FeedCategory;
use crate::config::{Config, FilterConfig};
use crate::datetime::reference_now;
use crate::error::Result;
use crate::feed::ParseMode;
use crate::filter::{filter_items, AdmissionPolicy, UnparsableDatePolicy};
use crate::rank::{clamp_limit, rank, RankedItem, DEFAULT_LIMIT};
use crate::route::{FetchAttempt, ResolvedRoute, RouteResolver};
use crate::score::score_match;

/// Days used when `days_window` is present but empty or not a number.
pub const DEFAULT_DAYS_WINDOW: i64 = 14;
/// Smallest accepted `days_window`.
pub const MIN_DAYS_WINDOW: i64 = 1;
/// Largest accepted `days_window`.
pub const MAX_DAYS_WINDOW: i64 = 90;

/// Parsed query parameters of a supplement request.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplementRequest {
    /// Trimmed free-text query.
    pub query: String,
    /// Freshness window for recent releases, already clamped.
    pub days_window: Option<i64>,
    /// Categories to resolve, in request order.
    pub feeds: Vec<FeedCategory>,
    /// Maximum number of items, already clamped.
    pub limit: usize,
    /// Attach the diagnostic trace.
    pub debug: bool,
}

impl Default for SupplementRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            days_window: None,
            feeds: FeedCategory::all().to_vec(),
            limit: DEFAULT_LIMIT,
            debug: false,
        }
    }
}

impl SupplementRequest {
    /// Build a request from a raw URL query string.
    ///
    /// Single-valued parameters use their first occurrence. `feeds` may be
    /// repeated; unknown keys are dropped and duplicates collapse. When no
    /// `feeds` parameter is given, every category is requested.
    pub fn from_query(raw: Option<&str>) -> Self {
        let mut query = None;
        let mut days = None;
        let mut limit = None;
        let mut debug = None;
        let mut feed_keys = Vec::new();

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "q" => {
                    query.get_or_insert(value.into_owned());
                }
                "days_window" => {
                    days.get_or_insert(value.into_owned());
                }
                "limit" => {
                    limit.get_or_insert(value.into_owned());
                }
                "debug" => {
                    debug.get_or_insert(value.into_owned());
                }
                "feeds" => feed_keys.push(value.into_owned()),
                _ => {}
            }
        }

        let feeds = if feed_keys.is_empty() {
            FeedCategory::all().to_vec()
        } else {
            let mut feeds = Vec::new();
            for category in feed_keys.iter().filter_map(|k| FeedCategory::from_key(k)) {
                if !feeds.contains(&category) {
                    feeds.push(category);
                }
            }
            feeds
        };

        Self {
            query: query.unwrap_or_default().trim().to_string(),
            days_window: days.map(|v| {
                lenient_int(&v)
                    .unwrap_or(DEFAULT_DAYS_WINDOW)
                    .clamp(MIN_DAYS_WINDOW, MAX_DAYS_WINDOW)
            }),
            feeds,
            limit: clamp_limit(
                limit
                    .as_deref()
                    .and_then(lenient_int)
                    .unwrap_or(DEFAULT_LIMIT as i64),
            ),
            debug: debug.as_deref() == Some("1"),
        }
    }
}

/// Leading-integer parse: optional whitespace and sign, then digits.
/// Trailing garbage is ignored; no digits yields `None`.
fn lenient_int(value: &str) -> Option<i64> {
    let s = value.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    // Saturate absurdly long inputs; every caller clamps afterwards.
    let n = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -n } else { n })
}

/// Diagnostic record of one attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptTrace {
    pub tier: String,
    pub url: String,
    pub status: Option<u16>,
    pub content_type: String,
    pub bytes: usize,
    pub encoding: String,
    pub mode: ParseMode,
    pub item_count: usize,
    pub sample_title: String,
    pub error: Option<String>,
    pub xml_snippet: String,
}

impl From<&FetchAttempt> for AttemptTrace {
    fn from(attempt: &FetchAttempt) -> Self {
        Self {
            tier: attempt.tier.clone(),
            url: attempt.url.clone(),
            status: attempt.status,
            content_type: attempt.content_type.clone(),
            bytes: attempt.bytes,
            encoding: attempt.encoding.clone(),
            mode: attempt.mode,
            item_count: attempt.items.len(),
            sample_title: attempt
                .items
                .first()
                .map(|item| item.title.clone())
                .unwrap_or_default(),
            error: attempt.error.clone(),
            xml_snippet: attempt.xml_snippet.clone(),
        }
    }
}

/// Diagnostic record of one category.
#[derive(Debug, Clone, Serialize)]
pub struct FeedTrace {
    pub feed: &'static str,
    pub category: FeedCategory,
    pub route: String,
    pub attempts: Vec<AttemptTrace>,
}

impl From<&ResolvedRoute> for FeedTrace {
    fn from(route: &ResolvedRoute) -> Self {
        Self {
            feed: route.category.key(),
            category: route.category,
            route: route.route_label().to_string(),
            attempts: route.attempts.iter().map(AttemptTrace::from).collect(),
        }
    }
}

/// Response body of the supplement endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SupplementResponse {
    pub trace_id: String,
    pub items: Vec<RankedItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Vec<FeedTrace>>,
}

/// Aborts the wrapped tasks when dropped.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// The supplement pipeline.
#[derive(Debug, Clone)]
pub struct SupplementService {
    resolver: RouteResolver,
    filter: FilterConfig,
}

impl SupplementService {
    /// Create a service.
    pub fn new(resolver: RouteResolver, filter: FilterConfig) -> Self {
        Self { resolver, filter }
    }

    /// Create a service from the full configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            RouteResolver::from_config(config)?,
            config.filter.clone(),
        ))
    }

    /// The route resolver.
    pub fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    /// Run a request against the current clock.
    pub async fn run(&self, request: &SupplementRequest) -> Result<SupplementResponse> {
        self.run_at(request, Utc::now()).await
    }

    /// Run a request with an explicit UTC clock reading.
    pub async fn run_at(
        &self,
        request: &SupplementRequest,
        now_utc: DateTime<Utc>,
    ) -> Result<SupplementResponse> {
        let trace_id = format!("rss_{}", now_utc.timestamp_millis());
        let now = reference_now(now_utc, self.filter.local_offset_hours);
        let policy = AdmissionPolicy {
            days_window: request.days_window,
            unparsable: UnparsableDatePolicy::from_flag(self.filter.admit_unparsable_dates),
        };

        let routes = self.resolve_all(&request.feeds, &request.query).await?;

        let mut traces = Vec::new();
        let mut merged = Vec::new();
        for route in routes {
            if request.debug {
                traces.push(FeedTrace::from(&route));
            }
            let category = route.category;
            for item in filter_items(category, route.items, now, &policy) {
                let score = score_match(&request.query, &[&item.title, &item.description]);
                merged.push(RankedItem::new(category, item, score));
            }
        }

        let admitted = merged.len();
        let items = rank(merged, request.limit);
        info!(
            trace_id = %trace_id,
            feeds = request.feeds.len(),
            admitted,
            returned = items.len(),
            "Supplement request completed"
        );

        Ok(SupplementResponse {
            trace_id,
            items,
            debug: request.debug.then_some(traces),
        })
    }

    /// Resolve categories concurrently, returning routes in request order.
    async fn resolve_all(
        &self,
        feeds: &[FeedCategory],
        query: &str,
    ) -> Result<Vec<ResolvedRoute>> {
        let handles: Vec<_> = feeds
            .iter()
            .map(|&category| {
                let resolver = self.resolver.clone();
                let query = query.to_string();
                tokio::spawn(async move { resolver.resolve(category, &query).await })
            })
            .collect();
        let _guard = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());

        Ok(try_join_all(handles).await?)
    }
}
