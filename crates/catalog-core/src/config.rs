//! Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Which numeric format the source text uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericLocale {
    /// `1,234.5`
    DotDecimal,
    /// `1.234,5`
    CommaDecimal,
    /// Decide per token from the separators present.
    #[default]
    Auto,
}

/// What to write when no taxonomy category matches a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CategoryFallback {
    /// Use a generic bucket.
    Generic {
        category: String,
        sub_category: String,
    },
    /// Use the given labels and flag the record for manual review.
    ManualReview {
        category: String,
        sub_category: String,
    },
}

impl CategoryFallback {
    pub fn category(&self) -> &str {
        match self {
            Self::Generic { category, .. } | Self::ManualReview { category, .. } => category,
        }
    }

    pub fn sub_category(&self) -> &str {
        match self {
            Self::Generic { sub_category, .. } | Self::ManualReview { sub_category, .. } => {
                sub_category
            }
        }
    }

    pub fn needs_review(&self) -> bool {
        matches!(self, Self::ManualReview { .. })
    }
}

impl Default for CategoryFallback {
    fn default() -> Self {
        Self::Generic {
            category: "Uncategorized".to_string(),
            sub_category: "General".to_string(),
        }
    }
}

/// Translation backend and retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranslationConfig {
    /// HTTP endpoint of the text-transform service. `None` disables translation.
    pub endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub target_language: String,
    pub source_language: Option<String>,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Consecutive records without any service response before the run
    /// is declared an outage.
    pub outage_threshold: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            target_language: "he".to_string(),
            source_language: Some("en".to_string()),
            timeout_ms: 30_000,
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 8_000,
            outage_threshold: 3,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Records processed concurrently.
    pub concurrency: usize,
    pub max_key_features: usize,
    pub max_usage_scenarios: usize,
    pub numeric_locale: NumericLocale,
    /// Currency used when a raw record carries none.
    pub default_currency: Option<String>,
    /// Minimum similarity (0.0 - 1.0) for fuzzy boilerplate line matches.
    pub boilerplate_similarity: f64,
    pub category_fallback: CategoryFallback,
    pub translation: TranslationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_key_features: 8,
            max_usage_scenarios: 6,
            numeric_locale: NumericLocale::Auto,
            default_currency: None,
            boilerplate_similarity: 0.9,
            category_fallback: CategoryFallback::default(),
            translation: TranslationConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))?;
        info!("Loaded pipeline config from {}", path.display());
        Ok(config.normalized())
    }

    /// Apply environment overrides on top of `self`.
    pub fn from_env(mut self) -> Self {
        if let Some(n) = env_parse::<usize>("CATALOG_CONCURRENCY") {
            self.concurrency = n;
        }
        if let Ok(url) = std::env::var("CATALOG_TRANSLATE_URL") {
            if !url.trim().is_empty() {
                self.translation.endpoint = Some(url);
            }
        }
        if self.translation.api_key.is_none() {
            self.translation.api_key = std::env::var("CATALOG_TRANSLATE_API_KEY").ok();
        }
        if let Ok(lang) = std::env::var("CATALOG_TARGET_LANGUAGE") {
            self.translation.target_language = lang;
        }
        if let Some(ms) = env_parse::<u64>("CATALOG_TRANSLATE_TIMEOUT_MS") {
            self.translation.timeout_ms = ms;
        }
        if let Some(n) = env_parse::<u32>("CATALOG_TRANSLATE_ATTEMPTS") {
            self.translation.max_attempts = n;
        }
        if let Some(n) = env_parse::<usize>("CATALOG_OUTAGE_THRESHOLD") {
            self.translation.outage_threshold = n;
        }
        self.normalized()
    }

    /// Clamp values that would stall or disable the pipeline.
    fn normalized(mut self) -> Self {
        if self.concurrency == 0 {
            warn!("concurrency 0 is not usable, using 1");
            self.concurrency = 1;
        }
        if self.translation.max_attempts == 0 {
            self.translation.max_attempts = 1;
        }
        if self.translation.timeout_ms == 0 {
            warn!("translation timeout 0ms is not usable, using 1ms");
            self.translation.timeout_ms = 1;
        }
        if self.translation.outage_threshold == 0 {
            self.translation.outage_threshold = 1;
        }
        self.boilerplate_similarity = self.boilerplate_similarity.clamp(0.0, 1.0);
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}
