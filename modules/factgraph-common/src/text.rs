use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());
static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@(\w+)").unwrap());

const SPACED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ISO_UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Trim and collapse every whitespace run to a single space.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Every `#word` token in first-occurrence order, duplicates kept.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    capture_all(&HASHTAG_RE, text)
}

/// Every `@word` token in first-occurrence order, duplicates kept.
pub fn extract_mentions(text: &str) -> Vec<String> {
    capture_all(&MENTION_RE, text)
}

fn capture_all(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Best-effort ISO-8601 normalization. Not a validator: unknown shapes come
/// back unchanged, only an empty input yields `None`.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.contains('T') && raw.contains('Z') {
        return Some(raw.to_string());
    }
    if raw.contains('-') && raw.contains(':') {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, SPACED_TIMESTAMP_FORMAT) {
            return Some(dt.format(ISO_UTC_FORMAT).to_string());
        }
    }
    Some(raw.to_string())
}
