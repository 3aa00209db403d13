//! Pure text helpers: tag vocabulary, URL checksums, HTML escaping.

/// Canonicalizes a category term into the tag vocabulary: lowercased, with
/// surrounding whitespace and the separators `-`, `_`, `.` removed.
pub fn canonical_tag(term: &str) -> String {
    term.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | '.'))
        .collect()
}

/// Canonicalizes a list of terms, dropping empties and keeping the first
/// occurrence of each tag.
pub fn canonical_tags<'a, I>(terms: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tags: Vec<String> = Vec::new();
    for term in terms {
        let tag = canonical_tag(term);
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// CRC-32 (IEEE) of the URL bytes, the value stored in `bookmarks.url_crc32`.
pub fn url_crc32(url: &str) -> u32 {
    crc32fast::hash(url.as_bytes())
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
