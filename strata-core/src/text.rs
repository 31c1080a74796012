use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Lower-case and strip combining marks so "Café" matches "cafe".
pub fn normalize_for_search(value: &str) -> String {
    value
        .to_lowercase()
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

pub fn contains_text(haystack: &str, needle: &str) -> bool {
    normalize_for_search(haystack).contains(&normalize_for_search(needle))
}

/// Canonical `#tag` form: normalized, with exactly one leading `#`.
pub fn normalize_hash_tag(value: &str) -> String {
    let trimmed = value.trim().trim_matches('"').trim_start_matches('#');
    let mut tag = normalize_for_search(trimmed);
    tag.insert(0, '#');
    tag
}

fn hash_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)(#[^\s#@\]\[]+)").expect("valid hash tag regex"))
}

/// All distinct `#tags` in `content`, normalized, in first-seen order.
pub fn extract_hash_tags(content: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for captures in hash_tag_regex().captures_iter(content) {
        if let Some(raw) = captures.get(1).map(|m| m.as_str()) {
            let stripped = raw.trim_end_matches(|c: char| ",.;:!?)".contains(c));
            if stripped.len() <= 1 {
                continue;
            }
            let normalized = normalize_hash_tag(stripped);
            if !tags.iter().any(|t| t == &normalized) {
                tags.push(normalized);
            }
        }
    }
    tags
}
