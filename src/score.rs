//! Query relevance scoring.

/// Fraction of query terms found in the given fields.
///
/// The query is split on whitespace into lowercase terms; the fields are
/// joined with spaces into one lowercase haystack. Each term counts if it
/// occurs anywhere as a substring; a repeated term counts once per
/// repetition in both the hits and the total. An empty query scores `1.0`.
/// Haystack term frequency and field weighting are not considered.
///
/// # Examples
///
/// ```
/// use bookfeed::score::score_match;
///
/// assert_eq!(score_match("", &["anything"]), 1.0);
/// assert_eq!(score_match("foo bar", &["foo text"]), 0.5);
/// assert_eq!(score_match("xyz", &["abc"]), 0.0);
/// ```
pub fn score_match(query: &str, fields: &[&str]) -> f64 {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return 1.0;
    }

    let haystack = fields.join(" ").to_lowercase();
    let hits = terms
        .iter()
        .filter(|term| haystack.contains(term.as_str()))
        .count();

    hits as f64 / terms.len() as f64
}
