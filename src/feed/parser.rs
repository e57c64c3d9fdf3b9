//! RSS2.0 / Atom normalization.
//!
//! Both schemas are described by a [`Schema`] decision table: where the
//! entries live, and for each [`FeedItem`] field an ordered list of
//! [`Extract`] rules. The first rule that yields a non-empty value wins.

use crate::feed::tree::{parse_document, Field, XmlElement};
use crate::feed::types::{FeedItem, NormalizedFeed, ParseMode};

/// Marker text of an upstream error page served with a success status.
const ERROR_PAGE_TEXT: &str = "internal server error";

/// How to pull a string out of a field of an entry element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extract {
    /// Element text. For repeated elements, the first one's text.
    Text(&'static str),
    /// Plain text, or the `href` attribute when the element has attributes.
    Href(&'static str),
    /// Like [`Extract::Href`], but among repeated elements prefer the one
    /// with `rel="alternate"` (an absent `rel` counts as alternate).
    AlternateHref(&'static str),
}

/// FeedItem field targeted by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Title,
    Link,
    PublishedAt,
    Description,
}

struct FieldRule {
    target: Target,
    sources: &'static [Extract],
}

struct Schema {
    mode: ParseMode,
    root: &'static str,
    container: &'static [&'static str],
    entry: &'static str,
    rules: &'static [FieldRule],
}

const RSS2: Schema = Schema {
    mode: ParseMode::Rss,
    root: "rss",
    container: &["channel"],
    entry: "item",
    rules: &[
        FieldRule {
            target: Target::Title,
            sources: &[Extract::Text("title")],
        },
        FieldRule {
            target: Target::Link,
            sources: &[Extract::Href("link")],
        },
        FieldRule {
            target: Target::PublishedAt,
            sources: &[
                Extract::Text("pubDate"),
                Extract::Text("dc:date"),
                Extract::Text("dcterms:date"),
            ],
        },
        FieldRule {
            target: Target::Description,
            sources: &[
                Extract::Text("content:encoded"),
                Extract::Text("description"),
            ],
        },
    ],
};

const ATOM: Schema = Schema {
    mode: ParseMode::Atom,
    root: "feed",
    container: &[],
    entry: "entry",
    rules: &[
        FieldRule {
            target: Target::Title,
            sources: &[Extract::Text("title")],
        },
        FieldRule {
            target: Target::Link,
            sources: &[Extract::AlternateHref("link")],
        },
        FieldRule {
            target: Target::PublishedAt,
            sources: &[Extract::Text("updated"), Extract::Text("published")],
        },
        FieldRule {
            target: Target::Description,
            sources: &[
                Extract::Text("content:encoded"),
                Extract::Text("content"),
                Extract::Text("summary"),
            ],
        },
    ],
};

const SCHEMAS: &[&Schema] = &[&RSS2, &ATOM];

/// Parse decoded XML text into normalized feed items.
///
/// Never fails: malformed XML yields mode `none`, no items, and the parse
/// error in [`NormalizedFeed::error`]. A well-formed document matching
/// neither schema yields mode `none` with no error.
pub fn parse_feed(xml: &str) -> NormalizedFeed {
    match parse_document(xml) {
        Ok(root) => normalize(&root),
        Err(e) => NormalizedFeed::failed(e.to_string()),
    }
}

/// Normalize an element tree with the first schema that has entries.
pub fn normalize(root: &XmlElement) -> NormalizedFeed {
    for schema in SCHEMAS {
        if root.name != schema.root {
            continue;
        }
        let Some(container) = root.descend(schema.container) else {
            continue;
        };

        let items: Vec<FeedItem> = container
            .children_named(schema.entry)
            .map(|entry| apply_rules(entry, schema.rules))
            .collect();
        if !items.is_empty() {
            return NormalizedFeed {
                mode: schema.mode,
                items,
                error: None,
            };
        }
    }

    NormalizedFeed::default()
}

/// Whether a successful response body is actually an upstream error page.
///
/// Matches bodies mentioning "Internal Server Error" together with the
/// origin's domain marker, case-insensitively. Documents rooted at a feed
/// element never match, whatever their item text says.
pub fn is_upstream_error_page(text: &str, marker: &str) -> bool {
    if has_feed_root(text) {
        return false;
    }
    let lower = text.to_lowercase();
    lower.contains(ERROR_PAGE_TEXT) && (marker.is_empty() || lower.contains(&marker.to_lowercase()))
}

/// Whether the first element of `text` opens an RSS, RDF or Atom document.
fn has_feed_root(text: &str) -> bool {
    let mut rest = text.trim_start_matches('\u{feff}').trim_start();
    // Skip the XML declaration, processing instructions and comments.
    loop {
        if rest.starts_with("<?") {
            match rest.find("?>") {
                Some(end) => rest = rest[end + 2..].trim_start(),
                None => return false,
            }
        } else if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(end) => rest = rest[end + 3..].trim_start(),
                None => return false,
            }
        } else {
            break;
        }
    }
    ["<rss", "<feed", "<rdf:RDF"].iter().any(|root| {
        rest.strip_prefix(root)
            .and_then(|after| after.chars().next())
            .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
    })
}

fn apply_rules(entry: &XmlElement, rules: &[FieldRule]) -> FeedItem {
    let mut item = FeedItem::default();
    for rule in rules {
        let value = rule
            .sources
            .iter()
            .find_map(|source| extract(entry, *source))
            .unwrap_or_default();
        match rule.target {
            Target::Title => item.title = value,
            Target::Link => item.link = value,
            Target::PublishedAt => item.published_at = value,
            Target::Description => item.description = value,
        }
    }
    item
}

fn extract(entry: &XmlElement, rule: Extract) -> Option<String> {
    let value = match rule {
        Extract::Text(name) => match entry.field(name) {
            Field::Missing => None,
            Field::Text(text) => Some(text),
            Field::Element(el) => Some(el.text.as_str()),
            list @ Field::List(..) => list.elements().first().copied().map(|el| el.text.as_str()),
        },
        Extract::Href(name) => match entry.field(name) {
            Field::Missing => None,
            Field::Text(text) => Some(text),
            Field::Element(el) => Some(href_or_text(el)),
            list @ Field::List(..) => list.elements().first().copied().map(href_or_text),
        },
        Extract::AlternateHref(name) => match entry.field(name) {
            Field::Missing => None,
            Field::Text(text) => Some(text),
            Field::Element(el) => Some(href_or_text(el)),
            list @ Field::List(..) => {
                let links = list.elements();
                links
                    .iter()
                    .find(|el| el.attr("rel").unwrap_or("alternate") == "alternate")
                    .or_else(|| links.first())
                    .copied()
                    .map(href_or_text)
            }
        },
    };

    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn href_or_text(el: &XmlElement) -> &str {
    el.attr("href").unwrap_or(&el.text)
}
