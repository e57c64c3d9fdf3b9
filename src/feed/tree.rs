//! Generic attributed element tree.
//!
//! Feed documents are first read into a schema-agnostic tree of elements.
//! Lookups address child elements by their qualified name (`content:encoded`)
//! and attributes by name with the [`ATTR_PREFIX`] (`@_href`), so the two
//! namespaces never collide.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Prefix that addresses an attribute rather than a child element.
pub const ATTR_PREFIX: &str = "@_";

/// Maximum element nesting accepted from a document.
const MAX_DEPTH: usize = 64;

/// Errors raised while building the element tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Malformed XML.
    #[error("XML parse error: {0}")]
    Xml(String),
    /// Document nested deeper than [`MAX_DEPTH`].
    #[error("document nested deeper than {0} elements")]
    TooDeep(usize),
    /// Input ended with open elements.
    #[error("unclosed element: {0}")]
    Unclosed(String),
    /// No root element at all.
    #[error("document has no root element")]
    Empty,
}

/// An XML element with its attributes, concatenated text and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified element name, including any namespace prefix.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Concatenated, trimmed text and CDATA content.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

/// Shape of a looked-up field.
///
/// A field may be absent, a plain text leaf, a single element carrying
/// attributes or children, or a repeated element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    /// No such child or attribute.
    Missing,
    /// A leaf element without attributes, or an attribute value.
    Text(&'a str),
    /// A single element that has attributes or child elements.
    Element(&'a XmlElement),
    /// Two or more elements sharing the name.
    List(&'a [XmlElement], &'a str),
}

impl XmlElement {
    /// Get an attribute value by its bare name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get the first child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Iterate child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a path of child names, taking the first match at each step.
    pub fn descend(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Whether this element is a plain text leaf.
    pub fn is_leaf(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }

    /// Look up a field by key.
    ///
    /// Keys starting with [`ATTR_PREFIX`] address attributes; all other keys
    /// address child elements.
    pub fn field<'a>(&'a self, key: &'a str) -> Field<'a> {
        if let Some(attr) = key.strip_prefix(ATTR_PREFIX) {
            return match self.attr(attr) {
                Some(value) => Field::Text(value),
                None => Field::Missing,
            };
        }

        let mut matches = self.children_named(key);
        match (matches.next(), matches.next()) {
            (None, _) => Field::Missing,
            (Some(only), None) if only.is_leaf() => Field::Text(&only.text),
            (Some(only), None) => Field::Element(only),
            (Some(_), Some(_)) => Field::List(&self.children, key),
        }
    }
}

impl<'a> Field<'a> {
    /// Elements of a [`Field::List`], in document order.
    pub fn elements(&self) -> Vec<&'a XmlElement> {
        match *self {
            Field::List(children, name) => children.iter().filter(|c| c.name == name).collect(),
            Field::Element(el) => vec![el],
            _ => Vec::new(),
        }
    }
}

/// Parse a decoded XML document into its root element.
///
/// Text is trimmed, entity references are unescaped (unknown entities are
/// kept verbatim) and CDATA is merged into the element text.
pub fn parse_document(xml: &str) -> Result<XmlElement, TreeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(TreeError::TooDeep(MAX_DEPTH));
                }
                stack.push(element_from_start(&e, &reader));
            }
            Ok(Event::Empty(e)) => {
                let element = element_from_start(&e, &reader);
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| TreeError::Xml("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(t)) => {
                if let Some(current) = stack.last_mut() {
                    let text = match t.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(_) => String::from_utf8_lossy(&t).into_owned(),
                    };
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(String::from_utf8_lossy(&c.into_inner()).trim());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TreeError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(TreeError::Unclosed(open.name.clone()));
    }

    root.ok_or(TreeError::Empty)
}

fn element_from_start(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> XmlElement {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let decoder = reader.decoder();

    let attributes = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = match attr.decode_and_unescape_value(decoder) {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            (key, value)
        })
        .collect();

    XmlElement {
        name,
        attributes,
        ..Default::default()
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            // Keep the first root; trailing top-level elements are ignored.
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
