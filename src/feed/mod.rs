//! Feed parsing module for bookfeed.
//!
//! Decoded XML is read into a generic element tree and then normalized
//! into [`FeedItem`]s using the RSS2.0 or Atom field mapping.

pub mod parser;
pub mod tree;
pub mod types;

pub use parser::{is_upstream_error_page, normalize, parse_feed};
pub use tree::{parse_document, Field, TreeError, XmlElement, ATTR_PREFIX};
pub use types::{FeedItem, NormalizedFeed, ParseMode};
