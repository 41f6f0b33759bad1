//! Key feature selection.
//!
//! Sentences are scored by list formatting, selling-point vocabulary, an
//! imperative/benefit opening verb and brevity. Spec lines never qualify.

use std::collections::HashSet;

use catalog_core::dedup_key;

use super::sentences::Sentence;
use crate::lexicon::Lexicon;

const MIN_CHARS: usize = 12;
const MAX_CHARS: usize = 160;
const SHORT_CHARS: usize = 100;
const MIN_SCORE: i32 = 3;

fn score(sentence: &Sentence, lexicon: &Lexicon) -> i32 {
    let text = sentence.text.as_str();
    let mut score = 0i32;

    if sentence.bulleted {
        score += 2;
    }

    score += lexicon.feature_indicators.count(text).min(3) as i32;

    let opening = text
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .unwrap_or_default();
    if lexicon.feature_verbs.contains(&opening) {
        score += 2;
    }

    if text.chars().count() <= SHORT_CHARS {
        score += 1;
    }
    if text.ends_with('?') {
        score -= 2;
    }
    score
}

/// Up to `max` feature sentences in source order.
pub fn extract_features(sentences: &[Sentence], lexicon: &Lexicon, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut features = Vec::new();

    for sentence in sentences {
        if features.len() >= max {
            break;
        }
        if sentence.spec_line {
            continue;
        }
        let length = sentence.text.chars().count();
        if !(MIN_CHARS..=MAX_CHARS).contains(&length) {
            continue;
        }
        // `Perfect for camping` belongs to the usage scenarios.
        if lexicon
            .usage_indicators
            .first(&sentence.text)
            .is_some_and(|m| m.start == 0)
        {
            continue;
        }
        if score(sentence, lexicon) < MIN_SCORE {
            continue;
        }
        let text = sentence.text.trim_end_matches(['.', ';', ',']).trim_end();
        if seen.insert(dedup_key(text)) {
            features.push(text.to_string());
        }
    }
    features
}
