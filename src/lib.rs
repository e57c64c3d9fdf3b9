//! bookfeed - publisher feed aggregator
//!
//! Fetches a publisher's recent-release and forthcoming feeds through a
//! tiered fallback chain, normalizes RSS 2.0 and Atom documents in any
//! declared character encoding, filters and scores the items against a
//! query, and serves the ranked result as JSON.

pub mod category;
pub mod config;
pub mod datetime;
pub mod encoding;
pub mod error;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod probe;
pub mod rank;
pub mod route;
pub mod score;
pub mod service;
pub mod web;

pub use category::FeedCategory;
pub use config::Config;
pub use error::{BookfeedError, Result};
pub use feed::{parse_feed, FeedItem, NormalizedFeed, ParseMode};
pub use rank::RankedItem;
pub use route::{FeedFetcher, FetchAttempt, ResolvedRoute, RouteResolver, Tier};
pub use service::{SupplementRequest, SupplementResponse, SupplementService};
pub use web::WebServer;
