//! Vocabulary term lookup (materials, colors).

use std::collections::HashSet;

use crate::lexicon::PhraseMatcher;

/// Canonical terms found in `text`, in order of first appearance.
pub fn extract_terms(matcher: &PhraseMatcher, text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    matcher
        .find_iter(text)
        .into_iter()
        .filter(|m| seen.insert(m.canonical.to_lowercase()))
        .map(|m| m.canonical.to_string())
        .collect()
}
