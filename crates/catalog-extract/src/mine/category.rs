//! Taxonomy classification by stemmed keyword hits.

use serde::Serialize;

use super::stemmer::stem_phrase;
use crate::lexicon::Lexicon;

/// Hits in the title (and storefront hints) count this many times more than
/// hits in the description.
const TITLE_WEIGHT: usize = 3;

/// Chosen category and subcategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryHint {
    pub category: String,
    pub sub_category: String,
    /// A taxonomy node matched; `false` means the fallback was used.
    pub matched: bool,
    /// Set under manual review when either label came from the fallback.
    pub needs_review: bool,
}

fn occurrences(tokens: &[String], keyword: &[String]) -> usize {
    if keyword.is_empty() || tokens.len() < keyword.len() {
        return 0;
    }
    tokens
        .windows(keyword.len())
        .filter(|window| *window == keyword)
        .count()
}

fn weighted(keywords: &[Vec<String>], title: &[String], description: &[String]) -> usize {
    keywords
        .iter()
        .map(|k| TITLE_WEIGHT * occurrences(title, k) + occurrences(description, k))
        .sum()
}

/// Classify a product into the taxonomy.
///
/// The highest-scoring category wins; ties go to the one listed first. With
/// no hits at all the configured fallback is returned. A matched category
/// without a sub-category hit takes the fallback sub-category.
pub fn classify(title: &str, description: &str, hints: &[String], lexicon: &Lexicon) -> CategoryHint {
    let mut title_tokens = stem_phrase(title);
    for hint in hints {
        title_tokens.extend(stem_phrase(hint));
    }
    let description_tokens = stem_phrase(description);

    let mut best: Option<(usize, &str, Option<&str>)> = None;
    for category in &lexicon.taxonomy {
        let own = weighted(&category.keywords, &title_tokens, &description_tokens);
        let mut best_sub: Option<(usize, &str)> = None;
        let mut total = own;
        for sub in &category.subcategories {
            let score = weighted(&sub.keywords, &title_tokens, &description_tokens);
            total += score;
            if score > 0 && best_sub.map_or(true, |(s, _)| score > s) {
                best_sub = Some((score, sub.name.as_str()));
            }
        }
        if total == 0 {
            continue;
        }
        if best.map_or(true, |(s, _, _)| total > s) {
            best = Some((total, category.name.as_str(), best_sub.map(|(_, name)| name)));
        }
    }

    match best {
        Some((_, category, sub_category)) => CategoryHint {
            category: category.to_string(),
            sub_category: sub_category
                .unwrap_or_else(|| lexicon.fallback.sub_category())
                .to_string(),
            matched: true,
            needs_review: sub_category.is_none() && lexicon.fallback.needs_review(),
        },
        None => CategoryHint {
            category: lexicon.fallback.category().to_string(),
            sub_category: lexicon.fallback.sub_category().to_string(),
            matched: false,
            needs_review: lexicon.fallback.needs_review(),
        },
    }
}
