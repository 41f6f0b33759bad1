//! Usage scenario phrases (`ideal for camping, hiking and travel`).

use std::collections::HashSet;

use catalog_core::dedup_key;
use once_cell::sync::Lazy;
use regex::Regex;

use super::sentences::Sentence;
use crate::lexicon::Lexicon;

static LIST_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:,|/|&|\band\b|\bor\b)\s*").unwrap());

const MAX_WORDS: usize = 6;
const LEADING_WORDS: &[&str] = &["the", "a", "an", "your", "all", "any"];

/// Scenario phrases following a usage indicator, in source order.
///
/// Phrases equal (case-insensitively) to an entry of `exclude` are skipped.
pub fn extract_usage(
    sentences: &[Sentence],
    lexicon: &Lexicon,
    max: usize,
    exclude: &HashSet<String>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut scenarios = Vec::new();

    for sentence in sentences {
        let text = sentence.text.as_str();
        let Some(found) = lexicon.usage_indicators.first(text) else {
            continue;
        };
        let tail = text[found.end..].trim_start_matches([':', ' ']);
        let clause = tail
            .split(['.', '!', '?', ';', ':', '(', ')'])
            .next()
            .unwrap_or_default();

        for part in LIST_SEPARATOR.split(clause) {
            if scenarios.len() >= max {
                return scenarios;
            }
            let phrase = strip_leading_words(part.trim());
            let words = phrase.split_whitespace().count();
            if words == 0 || words > MAX_WORDS || !phrase.chars().any(char::is_alphabetic) {
                continue;
            }
            let key = dedup_key(phrase);
            if exclude.contains(&key) || !seen.insert(key) {
                continue;
            }
            scenarios.push(phrase.to_string());
        }
    }
    scenarios
}

fn strip_leading_words(mut phrase: &str) -> &str {
    loop {
        let Some((first, rest)) = phrase.split_once(char::is_whitespace) else {
            return phrase;
        };
        if LEADING_WORDS.contains(&first.to_lowercase().as_str()) {
            phrase = rest.trim_start();
        } else {
            return phrase;
        }
    }
}
