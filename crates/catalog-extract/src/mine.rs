//! Attribute mining from sanitized product text.
//!
//! Pure functions of the text and the lexicon: materials, colors, key
//! features, technical specifications, category and usage scenarios.

pub mod category;
pub mod features;
pub mod sentences;
pub mod specs;
pub mod stemmer;
pub mod terms;
pub mod usage;

use std::collections::HashSet;

use catalog_core::{dedup_key, SpecEntry};
use serde::Serialize;

pub use category::CategoryHint;

use crate::lexicon::Lexicon;
use crate::sanitize::SanitizedText;

/// Everything mined from one product's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinedAttributes {
    pub materials: Vec<String>,
    pub colors: Vec<String>,
    pub key_features: Vec<String>,
    pub technical_specs: Vec<SpecEntry>,
    pub category: CategoryHint,
    pub usage_scenarios: Vec<String>,
}

/// Mine attributes from a description and title.
pub fn mine(description: &SanitizedText, title: &SanitizedText, lexicon: &Lexicon) -> MinedAttributes {
    mine_with_hints(description, title, &[], lexicon)
}

/// Like [`mine`], with storefront hints (product type, tags) that only
/// inform the category.
pub fn mine_with_hints(
    description: &SanitizedText,
    title: &SanitizedText,
    hints: &[String],
    lexicon: &Lexicon,
) -> MinedAttributes {
    let combined = format!("{}\n{}", title.as_str(), description.as_str());
    let limits = lexicon.limits();

    let sentences =
        sentences::split_sentences(description.as_str(), |line| specs::parse_spec_line(line).is_some());
    let key_features = features::extract_features(&sentences, lexicon, limits.max_key_features);
    let feature_keys: HashSet<String> = key_features.iter().map(|f| dedup_key(f)).collect();

    MinedAttributes {
        materials: terms::extract_terms(&lexicon.materials, &combined),
        colors: terms::extract_terms(&lexicon.colors, &combined),
        technical_specs: specs::extract_specs(description, lexicon),
        category: category::classify(title.as_str(), description.as_str(), hints, lexicon),
        usage_scenarios: usage::extract_usage(
            &sentences,
            lexicon,
            limits.max_usage_scenarios,
            &feature_keys,
        ),
        key_features,
    }
}
