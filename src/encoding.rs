//! Character encoding detection for feed bodies.
//!
//! Feeds from Japanese publishers arrive as Shift_JIS, EUC-JP or UTF-8,
//! declared either in the `Content-Type` header or in the XML declaration.
//! Everything is decoded to a UTF-8 `String` before parsing.

use encoding_rs::Encoding;

/// Number of leading bytes searched for an XML declaration.
pub const PROBE_LEN: usize = 2048;

/// Label reported when the declared charset is unknown and UTF-8 was used instead.
pub const FALLBACK_LABEL: &str = "utf-8(fallback)";

/// Result of decoding a feed body.
#[derive(Debug, Clone)]
pub struct DecodedText {
    /// The decoded UTF-8 text.
    pub text: String,
    /// Canonical label of the encoding that was used, or [`FALLBACK_LABEL`].
    pub encoding: String,
    /// Whether malformed sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

/// Extract the `charset=` token from a `Content-Type` header value.
///
/// Matching is case-insensitive and the value may be double-quoted.
/// The returned charset is lowercased.
///
/// # Examples
///
/// ```
/// use bookfeed::encoding::charset_from_content_type;
///
/// assert_eq!(
///     charset_from_content_type("text/xml; charset=\"Shift_JIS\""),
///     Some("shift_jis".to_string())
/// );
/// assert_eq!(charset_from_content_type("application/rss+xml"), None);
/// ```
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    let lower = content_type.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(pos) = lower[search_from..].find("charset") {
        let after = &lower[search_from + pos + "charset".len()..];
        search_from += pos + "charset".len();

        let rest = after.trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        let (quoted, rest) = match rest.strip_prefix('"') {
            Some(r) => (true, r),
            None => (false, rest),
        };

        let value: String = rest
            .chars()
            .take_while(|c| *c != '"' && *c != ';' && !c.is_whitespace())
            .collect();
        if value.is_empty() {
            continue;
        }
        if quoted && !rest[value.len()..].starts_with('"') {
            continue;
        }
        return Some(value);
    }

    None
}

/// Find the `encoding` attribute of an XML declaration in the leading bytes.
///
/// Only the first [`PROBE_LEN`] bytes are inspected, as ASCII-compatible text.
/// The returned value is lowercased.
pub fn charset_from_xml_declaration(bytes: &[u8]) -> Option<String> {
    let probe = &bytes[..bytes.len().min(PROBE_LEN)];
    let lower = probe.to_ascii_lowercase();

    let start = find_bytes(&lower, b"<?xml")?;
    let decl_end = lower[start..]
        .iter()
        .position(|b| *b == b'>')
        .map(|p| start + p)
        .unwrap_or(lower.len());
    let decl = &lower[start..decl_end];

    let attr = find_bytes(decl, b"encoding=")?;
    let rest = &decl[attr + b"encoding=".len()..];
    let quote = *rest.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let rest = &rest[1..];
    let len = rest.iter().position(|b| *b == b'"' || *b == b'\'')?;
    if len == 0 {
        return None;
    }

    std::str::from_utf8(&rest[..len]).ok().map(str::to_string)
}

/// Map a detected charset onto its canonical label.
///
/// Absent charsets and `utf8` resolve to `utf-8`; the Shift_JIS aliases
/// resolve to `shift_jis`. Anything else is returned unchanged.
pub fn canonical_label(charset: Option<&str>) -> String {
    match charset.map(|c| c.trim().to_ascii_lowercase()) {
        None => "utf-8".to_string(),
        Some(c) => match c.as_str() {
            "" | "utf8" => "utf-8".to_string(),
            "shift-jis" | "sjis" | "shift_jis" => "shift_jis".to_string(),
            _ => c,
        },
    }
}

/// Decode a feed body to UTF-8.
///
/// The charset is taken from the `Content-Type` header first, then from
/// the XML declaration, and defaults to UTF-8. An unrecognized charset
/// falls back to lossy UTF-8 decoding labeled [`FALLBACK_LABEL`]; this
/// never fails.
pub fn decode_feed(bytes: &[u8], content_type: Option<&str>) -> DecodedText {
    let detected = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_xml_declaration(bytes));
    let label = canonical_label(detected.as_deref());

    match Encoding::for_label(label.as_bytes()) {
        Some(encoding) => {
            let (text, _, had_errors) = encoding.decode(bytes);
            DecodedText {
                text: text.into_owned(),
                encoding: label,
                had_errors,
            }
        }
        None => {
            tracing::debug!(charset = %label, "Unsupported charset, decoding as UTF-8");
            let text = String::from_utf8_lossy(bytes);
            let had_errors = text.contains('\u{FFFD}');
            DecodedText {
                text: text.into_owned(),
                encoding: FALLBACK_LABEL.to_string(),
                had_errors,
            }
        }
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{EUC_JP, SHIFT_JIS};

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(
            charset_from_content_type("text/xml; charset=Shift_JIS"),
            Some("shift_jis".to_string())
        );
        assert_eq!(
            charset_from_content_type("text/xml;CHARSET = EUC-JP"),
            Some("euc-jp".to_string())
        );
        assert_eq!(
            charset_from_content_type("application/rss+xml; charset=\"utf-8\"; q=1"),
            Some("utf-8".to_string())
        );
        assert_eq!(charset_from_content_type("text/xml"), None);
        assert_eq!(charset_from_content_type("text/xml; charset="), None);
        assert_eq!(charset_from_content_type(""), None);
    }

    #[test]
    fn test_charset_from_xml_declaration() {
        let xml = br#"<?xml version="1.0" encoding="Shift_JIS"?><rss/>"#;
        assert_eq!(
            charset_from_xml_declaration(xml),
            Some("shift_jis".to_string())
        );

        let single = b"<?xml version='1.0' encoding='euc-jp'?><rss/>";
        assert_eq!(
            charset_from_xml_declaration(single),
            Some("euc-jp".to_string())
        );

        assert_eq!(charset_from_xml_declaration(b"<?xml version=\"1.0\"?>"), None);
        assert_eq!(charset_from_xml_declaration(b"<rss></rss>"), None);
    }

    #[test]
    fn test_xml_declaration_beyond_probe_is_ignored() {
        let mut body = vec![b' '; PROBE_LEN];
        body.extend_from_slice(br#"<?xml version="1.0" encoding="Shift_JIS"?>"#);
        assert_eq!(charset_from_xml_declaration(&body), None);
    }

    #[test]
    fn test_canonical_label() {
        assert_eq!(canonical_label(None), "utf-8");
        assert_eq!(canonical_label(Some("utf8")), "utf-8");
        assert_eq!(canonical_label(Some("UTF-8")), "utf-8");
        assert_eq!(canonical_label(Some("shift-jis")), "shift_jis");
        assert_eq!(canonical_label(Some("sjis")), "shift_jis");
        assert_eq!(canonical_label(Some("Shift_JIS")), "shift_jis");
        assert_eq!(canonical_label(Some("euc-jp")), "euc-jp");
    }

    #[test]
    fn test_decode_shiftjis_from_header_matches_utf8() {
        let content = "<rss><channel><item><title>新刊案内</title></item></channel></rss>";
        let (sjis, _, _) = SHIFT_JIS.encode(content);

        let from_sjis = decode_feed(&sjis, Some("text/xml; charset=Shift_JIS"));
        let from_utf8 = decode_feed(content.as_bytes(), Some("text/xml; charset=UTF-8"));

        assert_eq!(from_sjis.text, from_utf8.text);
        assert_eq!(from_sjis.encoding, "shift_jis");
        assert_eq!(from_utf8.encoding, "utf-8");
        assert!(!from_sjis.had_errors);
    }

    #[test]
    fn test_decode_eucjp_from_declaration() {
        let content = r#"<?xml version="1.0" encoding="EUC-JP"?><rss><title>近刊</title></rss>"#;
        let (euc, _, _) = EUC_JP.encode(content);

        let decoded = decode_feed(&euc, None);
        assert_eq!(decoded.text, content);
        assert_eq!(decoded.encoding, "euc-jp");
    }

    #[test]
    fn test_header_takes_priority_over_declaration() {
        let content = r#"<?xml version="1.0" encoding="EUC-JP"?><title>テスト</title>"#;
        let (sjis, _, _) = SHIFT_JIS.encode(content);

        let decoded = decode_feed(&sjis, Some("text/xml; charset=sjis"));
        assert_eq!(decoded.encoding, "shift_jis");
        assert_eq!(decoded.text, content);
    }

    #[test]
    fn test_decode_defaults_to_utf8() {
        let decoded = decode_feed("<rss>日本語</rss>".as_bytes(), None);
        assert_eq!(decoded.encoding, "utf-8");
        assert_eq!(decoded.text, "<rss>日本語</rss>");
    }

    #[test]
    fn test_decode_unknown_charset_falls_back() {
        let decoded = decode_feed(b"<rss>plain</rss>", Some("text/xml; charset=x-klingon"));
        assert_eq!(decoded.encoding, FALLBACK_LABEL);
        assert_eq!(decoded.text, "<rss>plain</rss>");
        assert!(!decoded.had_errors);
    }
}
