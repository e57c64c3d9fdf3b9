//! Feed route resolution.
//!
//! A logical feed key maps to an ordered list of [`Tier`]s (direct origin,
//! encrypted origin, content proxy, site search). The [`RouteResolver`]
//! tries them in order until one yields items.

pub mod fetcher;
pub mod resolver;
pub mod tiers;

pub use fetcher::{FeedFetcher, FetchAttempt, SNIPPET_CHARS};
pub use resolver::{ResolvedRoute, RouteResolver};
pub use tiers::{build_tiers, join_origin, proxy_url, search_url, Tier};
