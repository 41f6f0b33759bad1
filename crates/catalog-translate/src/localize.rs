//! Record localization with per-call timeout and bounded retries.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use catalog_core::{ProductDraft, RecordDiagnostics, Result, TranslationConfig};
use tracing::{debug, warn};

use crate::fields::{translatable_fields, TextField};
use crate::service::TranslationService;
use crate::types::{TextUnit, TranslationResult};

/// Timeout and exponential backoff applied to translation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            timeout: Duration::from_millis(config.timeout_ms),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Delay before retry number `retry` (1-based): base, 2x base, 4x base, ... capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_max)
            .min(self.backoff_max)
    }
}

/// Sends a draft's text fields through a [`TranslationService`] and writes
/// the results back by field path.
pub struct Localizer {
    service: Arc<dyn TranslationService>,
    policy: RetryPolicy,
    target_language: String,
    source_language: Option<String>,
    unit_labels: HashMap<String, String>,
}

impl Localizer {
    pub fn new(service: Arc<dyn TranslationService>, config: &TranslationConfig) -> Self {
        Self {
            service,
            policy: RetryPolicy::from_config(config),
            target_language: config.target_language.clone(),
            source_language: config.source_language.clone(),
            unit_labels: HashMap::new(),
        }
    }

    /// Unit codes with a label here are localized locally and never sent out.
    pub fn with_unit_labels(mut self, labels: &BTreeMap<String, String>) -> Self {
        self.unit_labels = labels
            .iter()
            .map(|(code, label)| (code.to_lowercase(), label.clone()))
            .collect();
        self
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    /// Translate the designated fields of `draft`.
    ///
    /// Fields that still fail after the last attempt keep their source text
    /// and are listed in `diagnostics.translation_failures`. When no attempt
    /// got any response, `diagnostics.translation_unreachable` holds the last
    /// call error.
    pub async fn localize(
        &self,
        mut draft: ProductDraft,
        diagnostics: &mut RecordDiagnostics,
    ) -> Result<ProductDraft> {
        let mut fields = translatable_fields(&draft);

        // Unit codes with a configured label.
        fields.retain(|field| {
            if !field.is_unit() {
                return true;
            }
            let label = field
                .get(&draft.record)
                .and_then(|code| self.unit_labels.get(&code.to_lowercase()))
                .cloned();
            match (label, field.get_mut(&mut draft.record)) {
                (Some(label), Some(slot)) => {
                    *slot = label;
                    false
                }
                _ => true,
            }
        });

        if self.source_language.as_deref() == Some(self.target_language.as_str()) {
            return Ok(draft);
        }

        let mut by_path: HashMap<String, TextField> = HashMap::new();
        let mut pending: Vec<TextUnit> = Vec::new();
        for field in fields {
            let Some(text) = field.get(&draft.record) else { continue };
            let path = field.to_string();
            pending.push(TextUnit {
                field_path: path.clone(),
                source_text: text.to_string(),
                source_language_hint: self.source_language.clone(),
            });
            by_path.insert(path, field);
        }
        if pending.is_empty() {
            return Ok(draft);
        }

        let mut responded = false;
        let mut last_error = String::new();
        for attempt in 1..=self.policy.max_attempts {
            if pending.is_empty() {
                break;
            }
            if attempt > 1 {
                tokio::time::sleep(self.policy.backoff(attempt - 1)).await;
            }

            let call = self.service.translate_batch(&pending);
            let results = match tokio::time::timeout(self.policy.timeout, call).await {
                Ok(Ok(results)) => results,
                Ok(Err(e)) => {
                    warn!(
                        "Translation attempt {}/{} via {} failed: {}",
                        attempt,
                        self.policy.max_attempts,
                        self.service.name(),
                        e
                    );
                    last_error = e.to_string();
                    continue;
                }
                Err(_) => {
                    warn!(
                        "Translation attempt {}/{} via {} timed out after {:?}",
                        attempt,
                        self.policy.max_attempts,
                        self.service.name(),
                        self.policy.timeout
                    );
                    last_error = format!("timed out after {:?}", self.policy.timeout);
                    continue;
                }
            };
            responded = true;

            let mut results: HashMap<String, TranslationResult> = results
                .into_iter()
                .map(|r| (r.field_path.clone(), r))
                .collect();
            pending.retain(|unit| {
                let Some(result) = results.remove(&unit.field_path) else {
                    return true;
                };
                match result.translated_text {
                    Some(text) if !text.trim().is_empty() => {
                        if let Some(slot) = by_path
                            .get(&unit.field_path)
                            .and_then(|field| field.get_mut(&mut draft.record))
                        {
                            *slot = text;
                        }
                        false
                    }
                    _ => {
                        debug!(
                            "Field {} not translated: {}",
                            unit.field_path,
                            result.error.as_deref().unwrap_or("empty result")
                        );
                        true
                    }
                }
            });
        }

        if !pending.is_empty() {
            if !responded {
                diagnostics.translation_unreachable = Some(format!(
                    "{} after {} attempts: {}",
                    self.service.name(),
                    self.policy.max_attempts,
                    last_error
                ));
            }
            for unit in &pending {
                diagnostics.translation_failed(&unit.field_path);
            }
        }
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::PassthroughTranslator;
    use crate::types::TranslateError;
    use async_trait::async_trait;
    use catalog_core::SpecEntry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Uppercases everything, optionally failing selected paths or whole calls.
    struct StubTranslator {
        fail_paths: Vec<String>,
        fail_calls: usize,
        calls: AtomicUsize,
        batch_sizes: std::sync::Mutex<Vec<usize>>,
    }

    impl StubTranslator {
        fn new() -> Self {
            Self {
                fail_paths: Vec::new(),
                fail_calls: 0,
                calls: AtomicUsize::new(0),
                batch_sizes: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TranslationService for StubTranslator {
        async fn translate_batch(
            &self,
            units: &[TextUnit],
        ) -> std::result::Result<Vec<TranslationResult>, TranslateError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.batch_sizes.lock().unwrap().push(units.len());
            if call < self.fail_calls {
                return Err(TranslateError::Transport("connection refused".into()));
            }
            Ok(units
                .iter()
                .rev()
                .map(|u| {
                    if self.fail_paths.contains(&u.field_path) {
                        TranslationResult::failed(u.field_path.clone(), "unsupported")
                    } else {
                        TranslationResult::translated(u.field_path.clone(), u.source_text.to_uppercase())
                    }
                })
                .collect())
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn config() -> TranslationConfig {
        TranslationConfig {
            backoff_base_ms: 1,
            backoff_max_ms: 2,
            ..Default::default()
        }
    }

    fn draft() -> ProductDraft {
        let mut draft = ProductDraft::default();
        draft.record.title = "Lantern".into();
        draft.record.category = "Electronics".into();
        draft.record.colors = vec!["black".into(), "white".into()];
        draft.record.technical_specifications = vec![SpecEntry::new("Power", "5w")];
        draft.record.dimensions.unit = Some("cm".into());
        draft.record.brand = "Acme".into();
        draft
    }

    #[tokio::test]
    async fn test_results_matched_by_path() {
        let localizer = Localizer::new(Arc::new(StubTranslator::new()), &config());
        let mut diag = RecordDiagnostics::new(0);
        let out = localizer.localize(draft(), &mut diag).await.unwrap();
        assert_eq!(out.record.title, "LANTERN");
        assert_eq!(out.record.colors, vec!["BLACK", "WHITE"]);
        assert_eq!(out.record.technical_specifications[0], SpecEntry::new("POWER", "5W"));
        assert_eq!(out.record.dimensions.unit.as_deref(), Some("CM"));
        assert_eq!(out.record.brand, "Acme");
        assert!(diag.translation_failures.is_empty());
    }

    #[tokio::test]
    async fn test_failed_field_keeps_source_and_is_flagged() {
        let mut stub = StubTranslator::new();
        stub.fail_paths = vec!["title".into()];
        let stub = Arc::new(stub);
        let localizer = Localizer::new(stub.clone(), &config());
        let mut diag = RecordDiagnostics::new(0);
        let out = localizer.localize(draft(), &mut diag).await.unwrap();

        assert_eq!(out.record.title, "Lantern");
        assert_eq!(out.record.category, "ELECTRONICS");
        assert_eq!(diag.translation_failures, vec!["title"]);
        // Retries only resend the failed unit.
        assert_eq!(*stub.batch_sizes.lock().unwrap(), vec![7, 1, 1]);
    }

    #[tokio::test]
    async fn test_transient_outage_recovers() {
        let mut stub = StubTranslator::new();
        stub.fail_calls = 2;
        let localizer = Localizer::new(Arc::new(stub), &config());
        let mut diag = RecordDiagnostics::new(0);
        let out = localizer.localize(draft(), &mut diag).await.unwrap();
        assert_eq!(out.record.title, "LANTERN");
    }

    #[tokio::test]
    async fn test_unreachable_service_passes_record_through() {
        let mut stub = StubTranslator::new();
        stub.fail_calls = usize::MAX;
        let stub = Arc::new(stub);
        let localizer = Localizer::new(stub.clone(), &config());
        let mut diag = RecordDiagnostics::new(0);
        let out = localizer.localize(draft(), &mut diag).await.unwrap();

        assert_eq!(out.record.title, "Lantern");
        assert_eq!(diag.translation_failures.len(), 7);
        assert!(diag.translation_failures.iter().any(|p| p == "title"));
        let reason = diag.translation_unreachable.as_deref().unwrap();
        assert!(reason.contains("connection refused"));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeouts_mark_record_unreachable() {
        struct Stalled;

        #[async_trait]
        impl TranslationService for Stalled {
            async fn translate_batch(
                &self,
                units: &[TextUnit],
            ) -> std::result::Result<Vec<TranslationResult>, TranslateError> {
                tokio::time::sleep(Duration::from_millis(200)).await;
                PassthroughTranslator.translate_batch(units).await
            }

            fn name(&self) -> &str {
                "stalled"
            }
        }

        let config = TranslationConfig {
            timeout_ms: 10,
            max_attempts: 2,
            ..config()
        };
        let localizer = Localizer::new(Arc::new(Stalled), &config);
        let mut diag = RecordDiagnostics::new(0);
        let out = localizer.localize(draft(), &mut diag).await.unwrap();

        assert_eq!(out.record.category, "Electronics");
        assert!(diag.translation_unreachable.as_deref().unwrap().contains("timed out"));
        assert!(!diag.translation_failures.is_empty());
    }

    #[tokio::test]
    async fn test_unit_labels_applied_locally() {
        let labels: BTreeMap<String, String> = [("cm".to_string(), "ס\"מ".to_string())].into();
        let localizer = Localizer::new(Arc::new(PassthroughTranslator), &config()).with_unit_labels(&labels);
        let mut diag = RecordDiagnostics::new(0);
        let out = localizer.localize(draft(), &mut diag).await.unwrap();
        assert_eq!(out.record.dimensions.unit.as_deref(), Some("ס\"מ"));
        assert_eq!(out.record.title, "Lantern");
    }

    #[tokio::test]
    async fn test_same_language_skips_service() {
        let stub = Arc::new(StubTranslator::new());
        let config = TranslationConfig {
            target_language: "en".into(),
            ..config()
        };
        let localizer = Localizer::new(stub.clone(), &config);
        let mut diag = RecordDiagnostics::new(0);
        let out = localizer.localize(draft(), &mut diag).await.unwrap();
        assert_eq!(out.record.title, "Lantern");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::from_config(&TranslationConfig::default());
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(10), Duration::from_millis(8000));
        assert_eq!(policy.backoff(40), Duration::from_millis(8000));
    }
}
