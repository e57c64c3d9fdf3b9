//! Tiered route resolution.
//!
//! Tries each tier of a category strictly in order and stops at the first
//! attempt that satisfies [`FetchAttempt::is_success`]. Exhausting every
//! tier is not an error: the route is reported as failed with no items.

use tracing::{debug, info, warn};

use crate::category::FeedCategory;
use crate::config::{Config, SourcesConfig};
use crate::error::Result;
use crate::feed::FeedItem;
use crate::route::fetcher::{FeedFetcher, FetchAttempt};
use crate::route::tiers::build_tiers;

/// Outcome of resolving one category.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    /// The category that was resolved.
    pub category: FeedCategory,
    /// Label of the tier that succeeded, `None` when every tier failed.
    pub chosen: Option<String>,
    /// Items from the chosen tier (empty when failed).
    pub items: Vec<FeedItem>,
    /// Every attempt made, in order.
    pub attempts: Vec<FetchAttempt>,
}

impl ResolvedRoute {
    /// Route label for diagnostics: the chosen tier, or `failed`.
    pub fn route_label(&self) -> &str {
        self.chosen.as_deref().unwrap_or("failed")
    }
}

/// Resolves feed categories to items through the configured tiers.
#[derive(Debug, Clone)]
pub struct RouteResolver {
    fetcher: FeedFetcher,
    sources: SourcesConfig,
}

impl RouteResolver {
    /// Create a resolver with an existing fetcher.
    pub fn new(fetcher: FeedFetcher, sources: SourcesConfig) -> Self {
        Self { fetcher, sources }
    }

    /// Create a resolver from the full configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = FeedFetcher::new(&config.fetch, &config.sources.error_page_marker)?;
        Ok(Self::new(fetcher, config.sources.clone()))
    }

    /// The fetcher used for attempts.
    pub fn fetcher(&self) -> &FeedFetcher {
        &self.fetcher
    }

    /// The configured sources.
    pub fn sources(&self) -> &SourcesConfig {
        &self.sources
    }

    /// Resolve a category. The query only affects the search tiers.
    pub async fn resolve(&self, category: FeedCategory, query: &str) -> ResolvedRoute {
        let tiers = build_tiers(&self.sources, category, query);
        let mut attempts = Vec::with_capacity(tiers.len());

        for tier in &tiers {
            let attempt = self.fetcher.attempt(tier).await;
            debug!(
                feed = category.key(),
                tier = %tier.label,
                url = %tier.url,
                status = ?attempt.status,
                items = attempt.items.len(),
                error = ?attempt.error,
                "Feed attempt finished"
            );

            if attempt.is_success() {
                let items = attempt.items.clone();
                info!(
                    feed = category.key(),
                    tier = %tier.label,
                    items = items.len(),
                    tried = attempts.len() + 1,
                    "Feed route resolved"
                );
                attempts.push(attempt);
                return ResolvedRoute {
                    category,
                    chosen: Some(tier.label.clone()),
                    items,
                    attempts,
                };
            }
            attempts.push(attempt);
        }

        warn!(
            feed = category.key(),
            tried = attempts.len(),
            "All feed routes failed"
        );
        ResolvedRoute {
            category,
            chosen: None,
            items: Vec::new(),
            attempts,
        }
    }
}
