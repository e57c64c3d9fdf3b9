//! Acquisition tier construction.
//!
//! Pure functions that turn a feed category and query into the ordered
//! list of candidate URLs. No network access happens here.

use serde::Serialize;

use crate::category::FeedCategory;
use crate::config::SourcesConfig;

/// One candidate acquisition route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tier {
    /// Human-readable tier label, e.g. `direct-https` or `search:R2MODS`.
    pub label: String,
    /// URL to fetch.
    pub url: String,
}

impl Tier {
    fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Join an origin and a path with exactly one slash between them.
pub fn join_origin(origin: &str, path: &str) -> String {
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Wrap a URL with the content-proxy prefix.
pub fn proxy_url(prefix: &str, url: &str) -> String {
    format!("{prefix}{url}")
}

/// Build the site search URL for a query and response format.
///
/// An empty query uses the configured placeholder term. Returns `None`
/// when the configured origin cannot be parsed.
pub fn search_url(sources: &SourcesConfig, query: &str, format: &str) -> Option<String> {
    let term = match query.trim() {
        "" => sources.search_placeholder.as_str(),
        q => q,
    };

    let base = join_origin(&sources.origin_https, &sources.search_path);
    let mut url = url::Url::parse(&base).ok()?;
    url.query_pairs_mut()
        .append_pair("enc", "UTF-8")
        .append_pair("action_search_do4api", "true")
        .append_pair("format", format)
        .append_pair("flg_searchmode", "shousai")
        .append_pair("ORDERBY", "DateShuppan")
        .append_pair("ORDERBY2", "DateShotenhatsubai")
        .append_pair("SORTORDER", "DESC")
        .append_pair("searchqueryword", term);
    Some(url.into())
}

/// Build the ordered acquisition tiers for a category.
///
/// Order: direct plaintext, direct encrypted, proxied plaintext, proxied
/// encrypted, then for each search format the search URL followed by its
/// proxied form. Proxy tiers are omitted when no proxy prefix is configured.
pub fn build_tiers(sources: &SourcesConfig, category: FeedCategory, query: &str) -> Vec<Tier> {
    let path = match category {
        FeedCategory::RecentRelease => &sources.shinkan_path,
        FeedCategory::Forthcoming => &sources.kinkan_path,
    };
    let proxy = (!sources.proxy_prefix.is_empty()).then_some(sources.proxy_prefix.as_str());

    let http = join_origin(&sources.origin_http, path);
    let https = join_origin(&sources.origin_https, path);

    let mut tiers = vec![
        Tier::new("direct-http", http.clone()),
        Tier::new("direct-https", https.clone()),
    ];
    if let Some(prefix) = proxy {
        tiers.push(Tier::new("proxy-http", proxy_url(prefix, &http)));
        tiers.push(Tier::new("proxy-https", proxy_url(prefix, &https)));
    }

    for format in &sources.search_formats {
        let Some(url) = search_url(sources, query, format) else {
            continue;
        };
        if let Some(prefix) = proxy {
            let proxied = proxy_url(prefix, &url);
            tiers.push(Tier::new(format!("search:{format}"), url));
            tiers.push(Tier::new(format!("proxy-search:{format}"), proxied));
        } else {
            tiers.push(Tier::new(format!("search:{format}"), url));
        }
    }

    tiers
}
