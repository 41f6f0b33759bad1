//! `Key: Value` technical specification lines.

use catalog_core::{dedup_key, SpecEntry};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::sentences::strip_bullet;
use crate::lexicon::{normalize_phrase, Lexicon};
use crate::sanitize::SanitizedText;

static SPEC_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<key>[^:：]{1,40}?)\s*[:：]\s*(?P<value>\S.*)$").unwrap());

static SPEC_DASH_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<key>[^-–—:：]{1,30}?)\s+[-–—]\s+(?P<value>\S.*)$").unwrap());

const MAX_KEY_WORDS: usize = 5;
/// Longer values are prose that happens to contain a colon.
const MAX_VALUE_CHARS: usize = 150;
/// Dashes are common in prose, so the dashed form is held to tighter limits.
const MAX_DASH_KEY_WORDS: usize = 3;
const MAX_DASH_VALUE_CHARS: usize = 60;
const MAX_DASH_VALUE_WORDS: usize = 4;

/// Split a line of the form `Key: Value` or `Key - Value`. No vocabulary
/// filtering is applied.
pub fn parse_spec_line(line: &str) -> Option<(String, String)> {
    let (line, _) = strip_bullet(line);
    if let Some(caps) = SPEC_LINE.captures(line) {
        return split_pair(&caps, MAX_KEY_WORDS, MAX_VALUE_CHARS);
    }
    let caps = SPEC_DASH_LINE.captures(line)?;
    let (key, value) = split_pair(&caps, MAX_DASH_KEY_WORDS, MAX_DASH_VALUE_CHARS)?;
    if value.split_whitespace().count() > MAX_DASH_VALUE_WORDS {
        return None;
    }
    Some((key, value))
}

fn split_pair(caps: &Captures<'_>, max_key_words: usize, max_value_chars: usize) -> Option<(String, String)> {
    let key = caps.name("key")?.as_str().trim();
    let value = caps
        .name("value")?
        .as_str()
        .trim()
        .trim_end_matches(['.', ';', ','])
        .trim_end();

    if key.split_whitespace().count() > max_key_words || !key.chars().any(char::is_alphabetic) {
        return None;
    }
    // `https://...`
    if value.is_empty() || value.starts_with("//") || value.chars().count() > max_value_chars {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

/// Specification entries in first-seen order.
///
/// Keys are compared case- and whitespace-insensitively; a repeated key keeps
/// its first position and takes the last value.
pub fn extract_specs(text: &SanitizedText, lexicon: &Lexicon) -> Vec<SpecEntry> {
    let mut specs: IndexMap<String, SpecEntry> = IndexMap::new();
    for line in text.lines() {
        let Some((key, value)) = parse_spec_line(line) else {
            continue;
        };
        if lexicon.spec_key_blocklist.contains(&normalize_phrase(&key)) {
            continue;
        }
        if lexicon.placeholder_values.contains(&value.to_lowercase()) {
            continue;
        }
        specs.insert(dedup_key(&key), SpecEntry::new(key, value));
    }
    specs.into_values().collect()
}
