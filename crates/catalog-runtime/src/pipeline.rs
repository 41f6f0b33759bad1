//! One raw record in, one canonical product (or a rejection) out.

use std::sync::Arc;

use catalog_core::{
    Error, PipelineConfig, RawProduct, RecordDiagnostics, Rejection, Result, Vocabulary,
};
use catalog_extract::{
    extract_measurements_from, mine_with_hints, sanitize, select_measurements, Lexicon,
};
use catalog_schema::{assemble, dedupe_lists, validate, AssemblyContext, AssemblyInput};
use catalog_translate::{Localizer, TranslationService};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::types::RecordOutcome;

/// The sequential per-record stages. Shared read-only across concurrent records.
pub struct RecordPipeline {
    lexicon: Lexicon,
    localizer: Localizer,
    default_currency: Option<String>,
}

impl RecordPipeline {
    pub fn new(
        vocabulary: &Vocabulary,
        config: &PipelineConfig,
        translator: Arc<dyn TranslationService>,
    ) -> Result<Self> {
        let lexicon = Lexicon::new(vocabulary, config)?;
        let localizer =
            Localizer::new(translator, &config.translation).with_unit_labels(&vocabulary.unit_labels);
        Ok(Self {
            lexicon,
            localizer,
            default_currency: config.default_currency.clone(),
        })
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn translator_name(&self) -> &str {
        self.localizer.service_name()
    }

    /// Process a record given as untyped JSON.
    ///
    /// A value that does not have the raw record shape is rejected as
    /// malformed input instead of failing the run.
    pub async fn process_json(&self, index: usize, value: &Value) -> RecordOutcome {
        match serde_json::from_value::<RawProduct>(value.clone()) {
            Ok(raw) => self.process(index, &raw).await,
            Err(e) => {
                let mut diagnostics = RecordDiagnostics::new(index);
                diagnostics.source_hash = fingerprint(value);
                let err = Error::malformed("record", e.to_string());
                warn!("Record {} rejected: {}", index, err);
                diagnostics.rejection = Some(Rejection::from(&err));
                RecordOutcome {
                    product: None,
                    diagnostics,
                }
            }
        }
    }

    /// Run every stage for one record.
    ///
    /// Record-level failures become a rejection in the outcome and never
    /// affect other records.
    pub async fn process(&self, index: usize, raw: &RawProduct) -> RecordOutcome {
        let mut diagnostics = RecordDiagnostics::new(index);
        diagnostics.source_hash = fingerprint(raw);
        diagnostics.product_id = raw.identifier();

        match self.refine(raw, &mut diagnostics).await {
            Ok(product) => {
                debug!("Record {} accepted as {}", index, product.product_id());
                RecordOutcome {
                    product: Some(product),
                    diagnostics,
                }
            }
            Err(err) => {
                warn!(
                    "Record {} ({}) rejected: {}",
                    index,
                    diagnostics.product_id.as_deref().unwrap_or("no id"),
                    err
                );
                diagnostics.rejection = Some(Rejection::from(&err));
                RecordOutcome {
                    product: None,
                    diagnostics,
                }
            }
        }
    }

    async fn refine(
        &self,
        raw: &RawProduct,
        diagnostics: &mut RecordDiagnostics,
    ) -> Result<catalog_schema::CanonicalProduct> {
        let lexicon = &self.lexicon;
        let title = sanitize(raw.title.as_deref().unwrap_or_default(), lexicon);
        let description = sanitize(raw.description.as_deref().unwrap_or_default(), lexicon);

        let hints: Vec<String> = raw
            .product_type
            .iter()
            .chain(raw.tags.iter())
            .filter(|hint| !hint.trim().is_empty())
            .cloned()
            .collect();
        let mined = mine_with_hints(&description, &title, &hints, lexicon);

        let candidates = extract_measurements_from(&[&title, &description], lexicon);
        let measurements = select_measurements(&candidates);

        let ctx = AssemblyContext {
            lexicon,
            default_currency: self.default_currency.as_deref(),
        };
        let input = AssemblyInput {
            raw,
            title: &title,
            description: &description,
            mined: &mined,
            measurements: &measurements,
        };
        let draft = assemble(input, &ctx, diagnostics)?;

        let mut draft = self.localizer.localize(draft, diagnostics).await?;
        // Translation can make distinct entries collide.
        dedupe_lists(&mut draft);

        Ok(validate(draft)?)
    }
}

/// Hex SHA-256 of the record's JSON serialization.
pub fn fingerprint<T: serde::Serialize + ?Sized>(raw: &T) -> String {
    let bytes = serde_json::to_vec(raw).unwrap_or_default();
    hex::encode(Sha256::digest(&bytes))
}
