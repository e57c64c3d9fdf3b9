//! Connectivity probe.
//!
//! Issues one plain GET to the configured baseline URL and then one per
//! distinct candidate URL of every category, and reports reachability.
//! Bodies are not parsed.

use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::debug;

use crate::category::FeedCategory;
use crate::route::{build_tiers, RouteResolver};

/// Outcome for one URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProbeResult {
    /// A response arrived (any status).
    Reached {
        url: String,
        ok: bool,
        status: u16,
        content_type: Option<String>,
        ms: u64,
    },
    /// The request failed before a response arrived.
    Failed {
        url: String,
        ok: bool,
        error: String,
        ms: u64,
    },
}

impl ProbeResult {
    /// The probed URL.
    pub fn url(&self) -> &str {
        match self {
            ProbeResult::Reached { url, .. } | ProbeResult::Failed { url, .. } => url,
        }
    }

    /// Whether the URL answered with a 2xx status.
    pub fn is_ok(&self) -> bool {
        match self {
            ProbeResult::Reached { ok, .. } | ProbeResult::Failed { ok, .. } => *ok,
        }
    }
}

/// Probe response body.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// Completion time, RFC 3339.
    pub time: String,
    pub results: Vec<ProbeResult>,
}

/// The baseline URL followed by the distinct candidate URLs of every
/// category, in tier order.
pub fn probe_targets(resolver: &RouteResolver) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let baseline = &resolver.sources().probe_baseline_url;
    if !baseline.is_empty() {
        urls.push(baseline.clone());
    }
    for category in FeedCategory::all() {
        for tier in build_tiers(resolver.sources(), *category, "") {
            if !urls.contains(&tier.url) {
                urls.push(tier.url);
            }
        }
    }
    urls
}

/// Probe every target sequentially.
pub async fn run_probe(resolver: &RouteResolver) -> ProbeReport {
    let client = resolver.fetcher().client();
    let mut results = Vec::new();

    for url in probe_targets(resolver) {
        let start = Instant::now();
        let result = match client.get(&url).send().await {
            Ok(response) => ProbeResult::Reached {
                ok: response.status().is_success(),
                status: response.status().as_u16(),
                content_type: response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                ms: start.elapsed().as_millis() as u64,
                url,
            },
            Err(e) => ProbeResult::Failed {
                ok: false,
                error: e.to_string(),
                ms: start.elapsed().as_millis() as u64,
                url,
            },
        };
        debug!(url = %result.url(), ok = result.is_ok(), "Probe finished");
        results.push(result);
    }

    ProbeReport {
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_probe_targets_are_distinct() {
        let resolver = RouteResolver::from_config(&Config::default()).unwrap();
        let targets = probe_targets(&resolver);

        assert_eq!(targets[0], "https://example.com/");
        assert_eq!(targets[1], "http://www.hanmoto.com/bd/shinkan/feed/");
        assert!(targets.contains(&"https://www.hanmoto.com/bd/kinkan/feed/".to_string()));
        assert!(targets
            .iter()
            .any(|u| u.starts_with("https://r.jina.ai/https://www.hanmoto.com/bd/kinkan")));

        // Search tiers do not depend on the category and appear once.
        let searches = targets.iter().filter(|u| u.contains("search/index.php")).count();
        assert_eq!(searches, 4);

        let unique: std::collections::HashSet<_> = targets.iter().collect();
        assert_eq!(unique.len(), targets.len());
    }

    #[test]
    fn test_empty_baseline_is_skipped() {
        let mut config = Config::default();
        config.sources.probe_baseline_url = String::new();
        let resolver = RouteResolver::from_config(&config).unwrap();
        let targets = probe_targets(&resolver);

        assert_eq!(targets[0], "http://www.hanmoto.com/bd/shinkan/feed/");
        assert_eq!(targets.len(), 12);
    }

    #[test]
    fn test_result_serialization() {
        let reached = ProbeResult::Reached {
            url: "https://example.com/".to_string(),
            ok: true,
            status: 200,
            content_type: None,
            ms: 12,
        };
        let value = serde_json::to_value(&reached).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["status"], 200);
        assert!(value["content_type"].is_null());

        let failed = ProbeResult::Failed {
            url: "https://example.com/".to_string(),
            ok: false,
            error: "request failed".to_string(),
            ms: 3,
        };
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "request failed");
        assert!(value.get("status").is_none());
        assert!(!failed.is_ok());
    }
}
