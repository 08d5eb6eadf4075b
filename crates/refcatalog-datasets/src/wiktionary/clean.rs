use std::sync::LazyLock;

use regex::Regex;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(?:[^|\]]*\|)?([^\]]*)\]\]").expect("valid regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// Longest definition kept, in bytes, before the ellipsis.
pub const MAX_DEFINITION_BYTES: usize = 5000;

/// Remove HTML tags, unwrap `[[target|text]]` / `[[text]]` links, collapse
/// whitespace runs and trim.
pub fn strip_markup(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let s = HTML_TAG.replace_all(s, "");
    let s = WIKI_LINK.replace_all(&s, "$1");
    let s = WHITESPACE_RUN.replace_all(&s, " ");
    s.trim().to_string()
}

/// Cut `s` to at most `max` bytes on a char boundary and append `…`.
pub fn truncate_definition(s: String, max: usize) -> String {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&s[..end]);
    out.push('…');
    out
}

/// Drop repeated strings, keeping first occurrences in order.
pub fn dedup_strings(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_links_and_spaces() {
        assert_eq!(strip_markup("<b>bold</b>  text"), "bold text");
        assert_eq!(strip_markup("a [[house|home]] and [[cat]]"), "a home and cat");
        assert_eq!(strip_markup("  spaced \t\n out  "), "spaced out");
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_definition("short".into(), 10), "short");
        assert_eq!(truncate_definition("abcdef".into(), 3), "abc…");
        // "é" is two bytes; cutting at 2 would split it.
        assert_eq!(truncate_definition("aéb".into(), 2), "a…");
    }

    #[test]
    fn dedup_preserves_first_occurrence() {
        let out = dedup_strings(["b", "a", "b", "c", "a"].map(String::from));
        assert_eq!(out, vec!["b", "a", "c"]);
    }
}
