//! Vocabulary tables compiled into lookup structures.
//!
//! Built once at process start and shared read-only (behind `Arc`) by every
//! record's pipeline.

use std::collections::{HashMap, HashSet};

use catalog_core::{
    CategoryFallback, Error, NumericLocale, PipelineConfig, Result, UnitKind, UnitSystem,
    Vocabulary,
};
use regex::Regex;
use tracing::debug;

use crate::mine::stemmer::stem_phrase;
use crate::numeric::{parser_for, NumericParser};

/// Lowercase, punctuation folded to spaces, whitespace collapsed.
pub fn normalize_phrase(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case-insensitive whole-word matcher over a list of phrases.
///
/// Longer phrases win where two overlap (`stainless steel` over `steel`).
#[derive(Debug)]
pub struct PhraseMatcher {
    regex: Option<Regex>,
    canonical: HashMap<String, String>,
}

/// A phrase occurrence in the searched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub canonical: &'a str,
}

impl PhraseMatcher {
    pub fn new(phrases: &[String]) -> Result<Self> {
        let mut canonical = HashMap::new();
        let mut alternatives: Vec<&str> = Vec::new();
        for phrase in phrases {
            let phrase = phrase.trim();
            if phrase.is_empty() {
                continue;
            }
            let key = phrase.to_lowercase();
            if canonical.contains_key(&key) {
                continue;
            }
            canonical.insert(key, phrase.to_string());
            alternatives.push(phrase);
        }

        if alternatives.is_empty() {
            return Ok(Self {
                regex: None,
                canonical,
            });
        }

        alternatives.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        let body = alternatives
            .iter()
            .map(|p| regex::escape(p).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!(r"(?i)\b(?:{})\b", body))
            .map_err(|e| Error::Config(format!("invalid phrase list: {}", e)))?;

        Ok(Self {
            regex: Some(regex),
            canonical,
        })
    }

    pub fn find_iter<'a>(&'a self, text: &str) -> Vec<PhraseMatch<'a>> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };
        regex
            .find_iter(text)
            .filter_map(|m| {
                let key = m
                    .as_str()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                self.canonical.get(&key).map(|canonical| PhraseMatch {
                    start: m.start(),
                    end: m.end(),
                    canonical: canonical.as_str(),
                })
            })
            .collect()
    }

    pub fn count(&self, text: &str) -> usize {
        self.regex
            .as_ref()
            .map(|r| r.find_iter(text).count())
            .unwrap_or(0)
    }

    pub fn first<'a>(&'a self, text: &str) -> Option<PhraseMatch<'a>> {
        self.find_iter(text).into_iter().next()
    }
}

/// Resolved unit alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInfo {
    pub code: String,
    pub kind: UnitKind,
    pub system: UnitSystem,
}

#[derive(Debug)]
pub(crate) struct CompiledSubCategory {
    pub name: String,
    pub keywords: Vec<Vec<String>>,
}

#[derive(Debug)]
pub(crate) struct CompiledCategory {
    pub name: String,
    pub keywords: Vec<Vec<String>>,
    pub subcategories: Vec<CompiledSubCategory>,
}

/// Caps applied by the attribute miner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MineLimits {
    pub max_key_features: usize,
    pub max_usage_scenarios: usize,
}

/// Read-only compiled vocabulary plus the extraction settings of the run.
#[derive(Debug)]
pub struct Lexicon {
    pub(crate) boilerplate_phrases: Vec<String>,
    pub(crate) boilerplate_keys: HashSet<String>,
    pub(crate) boilerplate_tokens: Vec<String>,
    pub(crate) heading_tokens: HashSet<String>,
    pub(crate) similarity: f64,
    pub(crate) spec_key_blocklist: HashSet<String>,
    pub(crate) placeholder_values: HashSet<String>,
    pub(crate) materials: PhraseMatcher,
    pub(crate) colors: PhraseMatcher,
    pub(crate) feature_indicators: PhraseMatcher,
    pub(crate) feature_verbs: HashSet<String>,
    pub(crate) usage_indicators: PhraseMatcher,
    pub(crate) taxonomy: Vec<CompiledCategory>,
    pub(crate) fallback: CategoryFallback,
    pub(crate) limits: MineLimits,
    units: HashMap<String, UnitInfo>,
    status_map: HashMap<String, String>,
    unknown_vendor: String,
    unknown_brand: String,
    numeric_locale: NumericLocale,
}

impl Lexicon {
    pub fn new(vocabulary: &Vocabulary, config: &PipelineConfig) -> Result<Self> {
        let normalized_set = |items: &[String]| -> HashSet<String> {
            items
                .iter()
                .map(|s| normalize_phrase(s))
                .filter(|s| !s.is_empty())
                .collect()
        };

        let mut units = HashMap::new();
        for def in &vocabulary.units {
            let info = UnitInfo {
                code: def.code.clone(),
                kind: def.kind,
                system: def.system,
            };
            units.insert(def.code.to_lowercase(), info.clone());
            for alias in &def.aliases {
                units.insert(alias.to_lowercase(), info.clone());
            }
        }

        let taxonomy = vocabulary
            .categories
            .iter()
            .map(|c| CompiledCategory {
                name: c.name.clone(),
                keywords: compile_keywords(&c.keywords),
                subcategories: c
                    .subcategories
                    .iter()
                    .map(|s| CompiledSubCategory {
                        name: s.name.clone(),
                        keywords: compile_keywords(&s.keywords),
                    })
                    .collect(),
            })
            .collect::<Vec<_>>();

        let lexicon = Self {
            boilerplate_phrases: vocabulary
                .boilerplate_phrases
                .iter()
                .map(|p| normalize_phrase(p))
                .filter(|p| !p.is_empty())
                .collect(),
            boilerplate_keys: normalized_set(&vocabulary.boilerplate_keys),
            boilerplate_tokens: vocabulary
                .boilerplate_tokens
                .iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.trim().is_empty())
                .collect(),
            heading_tokens: normalized_set(&vocabulary.heading_tokens),
            similarity: config.boilerplate_similarity,
            spec_key_blocklist: normalized_set(&vocabulary.spec_key_blocklist),
            placeholder_values: vocabulary
                .placeholder_values
                .iter()
                .map(|v| v.trim().to_lowercase())
                .collect(),
            materials: PhraseMatcher::new(&vocabulary.materials)?,
            colors: PhraseMatcher::new(&vocabulary.colors)?,
            feature_indicators: PhraseMatcher::new(&vocabulary.feature_indicators)?,
            feature_verbs: vocabulary
                .feature_verbs
                .iter()
                .map(|v| v.trim().to_lowercase())
                .collect(),
            usage_indicators: PhraseMatcher::new(&vocabulary.usage_indicators)?,
            taxonomy,
            fallback: config.category_fallback.clone(),
            limits: MineLimits {
                max_key_features: config.max_key_features,
                max_usage_scenarios: config.max_usage_scenarios,
            },
            units,
            status_map: vocabulary
                .status_map
                .iter()
                .map(|(raw, canonical)| (raw.trim().to_lowercase(), canonical.clone()))
                .collect(),
            unknown_vendor: vocabulary.unknown_vendor.trim().to_lowercase(),
            unknown_brand: vocabulary.unknown_brand.clone(),
            numeric_locale: config.numeric_locale,
        };

        debug!(
            "Compiled lexicon: {} unit aliases, {} categories",
            lexicon.units.len(),
            lexicon.taxonomy.len()
        );
        Ok(lexicon)
    }

    /// Resolve a unit spelling (`inches`, `"`, `KG`, `cm.`) to its canonical unit.
    pub fn unit(&self, token: &str) -> Option<&UnitInfo> {
        let token = token.trim();
        let token = token.strip_suffix('.').unwrap_or(token);
        self.units.get(&token.to_lowercase())
    }

    /// Canonical status token for a raw status code.
    pub fn status(&self, raw: &str) -> Option<&str> {
        self.status_map
            .get(&raw.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn is_unknown_vendor(&self, vendor: &str) -> bool {
        vendor.trim().to_lowercase() == self.unknown_vendor
    }

    pub fn unknown_brand(&self) -> &str {
        &self.unknown_brand
    }

    pub fn limits(&self) -> MineLimits {
        self.limits
    }

    pub fn category_fallback(&self) -> &CategoryFallback {
        &self.fallback
    }

    pub fn numeric_parser(&self) -> &'static dyn NumericParser {
        parser_for(self.numeric_locale)
    }
}

fn compile_keywords(keywords: &[String]) -> Vec<Vec<String>> {
    keywords
        .iter()
        .map(|k| stem_phrase(k))
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::new(&Vocabulary::default(), &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_normalize_phrase() {
        assert_eq!(normalize_phrase("  Brand   Name: "), "brand name");
        assert_eq!(normalize_phrase("SPECIFICATIONS"), "specifications");
        assert_eq!(normalize_phrase("semi_choice"), "semi choice");
    }

    #[test]
    fn test_phrase_matcher_prefers_longest() {
        let matcher = PhraseMatcher::new(&[
            "steel".to_string(),
            "stainless steel".to_string(),
        ])
        .unwrap();
        let found = matcher.find_iter("Stainless Steel body, steel hinge");
        let names: Vec<&str> = found.iter().map(|m| m.canonical).collect();
        assert_eq!(names, vec!["stainless steel", "steel"]);
    }

    #[test]
    fn test_phrase_matcher_whole_words() {
        let matcher = PhraseMatcher::new(&["red".to_string()]).unwrap();
        assert_eq!(matcher.count("Reduced shipping"), 0);
        assert_eq!(matcher.count("RED and red"), 2);
        assert!(PhraseMatcher::new(&[]).unwrap().first("anything").is_none());
    }

    #[test]
    fn test_unit_aliases() {
        let lex = lexicon();
        assert_eq!(lex.unit("Inches").map(|u| u.code.as_str()), Some("in"));
        assert_eq!(lex.unit("\"").map(|u| u.code.as_str()), Some("in"));
        assert_eq!(lex.unit("LBS").map(|u| u.code.as_str()), Some("lb"));
        assert_eq!(lex.unit("cm.").map(|u| u.system), Some(UnitSystem::Metric));
        assert!(lex.unit("pieces").is_none());
    }

    #[test]
    fn test_status_and_vendor_lookups() {
        let lex = lexicon();
        assert_eq!(lex.status("ACTIVE"), Some("active"));
        assert_eq!(lex.status("pending"), None);
        assert!(lex.is_unknown_vendor(" noenname_null "));
        assert!(!lex.is_unknown_vendor("Acme"));
    }
}
