//! Merges raw fields, sanitized text, mined attributes and measurements into
//! a [`ProductDraft`].

use std::collections::HashSet;

use catalog_core::{
    dedup_key, model::value_to_string, Dimensions, Error, ProductDraft, ProductRecord,
    RawProduct, RawVariant, RecordDiagnostics, Result, SpecEntry, Variant, Weight,
};
use catalog_extract::mine::sentences::split_sentences;
use catalog_extract::{Lexicon, MeasurementSelection, MinedAttributes, NumericParser, SanitizedText};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

const SHORT_DESCRIPTION_SENTENCES: usize = 2;
const SHORT_DESCRIPTION_MAX_CHARS: usize = 300;

/// Run-wide settings the assembler needs.
pub struct AssemblyContext<'a> {
    pub lexicon: &'a Lexicon,
    /// Used when the raw record carries no currency.
    pub default_currency: Option<&'a str>,
}

/// Everything known about one record before assembly.
pub struct AssemblyInput<'a> {
    pub raw: &'a RawProduct,
    pub title: &'a SanitizedText,
    pub description: &'a SanitizedText,
    pub mined: &'a MinedAttributes,
    pub measurements: &'a MeasurementSelection,
}

/// Build the draft record.
///
/// Fails with [`Error::MalformedInput`] when a required field is missing or
/// cannot be coerced. Missing optional attributes and tie-break notes are
/// written to `diagnostics`.
pub fn assemble(
    input: AssemblyInput<'_>,
    ctx: &AssemblyContext<'_>,
    diagnostics: &mut RecordDiagnostics,
) -> Result<ProductDraft> {
    let raw = input.raw;
    let numbers = ctx.lexicon.numeric_parser();

    let product_id = raw
        .identifier()
        .ok_or_else(|| Error::malformed("productId", "missing or blank"))?;
    diagnostics.product_id = Some(product_id.clone());

    let variants = raw
        .variants
        .iter()
        .enumerate()
        .map(|(i, v)| assemble_variant(i, v, numbers, diagnostics))
        .collect::<Result<Vec<_>>>()?;

    let base_price = match raw.price.as_ref().filter(|v| !is_blank(v)) {
        Some(value) => coerce_number(value, numbers)
            .ok_or_else(|| Error::malformed("price", format!("not a number: {}", value)))?,
        None => match variants.first() {
            Some(first) => {
                diagnostics.note("basePrice: taken from the first variant");
                first.price
            }
            None => return Err(Error::malformed("price", "missing")),
        },
    };

    let currency = match non_blank(raw.currency.as_deref()) {
        Some(currency) => currency.to_string(),
        None => match ctx.default_currency {
            Some(default) => {
                diagnostics.note("currency: configured default used");
                default.to_string()
            }
            None => return Err(Error::malformed("currency", "missing")),
        },
    };

    let raw_status =
        non_blank(raw.status.as_deref()).ok_or_else(|| Error::malformed("status", "missing"))?;
    let status = match ctx.lexicon.status(raw_status) {
        Some(canonical) => canonical.to_string(),
        None => {
            diagnostics.unrecognized_status = Some(raw_status.to_string());
            raw_status.to_string()
        }
    };

    let (brand, brand_is_generic) = match non_blank(raw.vendor.as_deref()) {
        Some(vendor) if !ctx.lexicon.is_unknown_vendor(vendor) => (vendor.to_string(), false),
        _ => (ctx.lexicon.unknown_brand().to_string(), true),
    };

    let mut urls = raw.images.iter().filter_map(|image| image.url());
    let main_image_url = urls.next().map(str::to_string);
    let gallery_images: Vec<String> = urls.map(str::to_string).collect();

    let dimensions = input
        .measurements
        .dimensions
        .as_ref()
        .map(|d| Dimensions {
            length: Some(d.length),
            width: Some(d.width),
            height: d.height,
            unit: Some(d.unit.clone()),
        })
        .unwrap_or_default();
    let weight = input
        .measurements
        .weight
        .as_ref()
        .map(|w| Weight {
            value: Some(w.value),
            unit: Some(w.unit.clone()),
        })
        .unwrap_or_default();
    for note in &input.measurements.notes {
        diagnostics.note(note.clone());
    }

    let mined = input.mined;
    if !mined.category.matched {
        diagnostics.missing("category");
    }
    diagnostics.category_review = mined.category.needs_review;

    let record = ProductRecord {
        product_id,
        title: input.title.as_str().to_string(),
        short_description: short_description(input.description),
        long_description: input.description.as_str().to_string(),
        main_image_url,
        gallery_images,
        brand,
        category: mined.category.category.clone(),
        sub_category: mined.category.sub_category.clone(),
        key_features: mined.key_features.clone(),
        technical_specifications: mined.technical_specs.clone(),
        dimensions,
        weight,
        material: mined.materials.clone(),
        colors: mined.colors.clone(),
        variants,
        base_price,
        currency,
        status,
        usage_scenarios: mined.usage_scenarios.clone(),
    };
    report_missing(&record, diagnostics);

    let mut draft = ProductDraft {
        record,
        brand_is_generic,
    };
    dedupe_lists(&mut draft);
    debug!(
        "Assembled product {} ({} variants, {} missing attributes)",
        draft.record.product_id,
        draft.record.variants.len(),
        diagnostics.missing_attributes.len()
    );
    Ok(draft)
}

fn assemble_variant(
    index: usize,
    raw: &RawVariant,
    numbers: &dyn NumericParser,
    diagnostics: &mut RecordDiagnostics,
) -> Result<Variant> {
    let field = |name: &str| format!("variants[{}].{}", index, name);

    let id = raw
        .id
        .as_ref()
        .and_then(value_to_string)
        .ok_or_else(|| Error::malformed(field("id"), "missing or blank"))?;

    let price = match raw.price.as_ref().filter(|v| !v.is_null()) {
        Some(value) => coerce_number(value, numbers)
            .ok_or_else(|| Error::malformed(field("price"), format!("not a number: {}", value)))?,
        None => return Err(Error::malformed(field("price"), "missing")),
    };

    let compare_at_price = match raw.compare_at_price.as_ref().filter(|v| !is_blank(v)) {
        Some(value) => {
            let coerced = coerce_number(value, numbers);
            if coerced.is_none() {
                diagnostics.note(format!("{}: not a number, dropped", field("compareAtPrice")));
            }
            coerced
        }
        None => None,
    };

    let inventory = match raw.inventory.as_ref().filter(|v| !is_blank(v)) {
        Some(value) => coerce_integer(value, numbers).ok_or_else(|| {
            Error::malformed(field("inventory"), format!("not an integer: {}", value))
        })?,
        None => 0,
    };

    Ok(Variant {
        id,
        title: raw.title.as_deref().map(str::trim).unwrap_or_default().to_string(),
        sku: raw.sku.as_deref().map(str::trim).unwrap_or_default().to_string(),
        price,
        compare_at_price,
        inventory,
    })
}

/// A JSON number, or a numeric string such as `"12.50"` or `"-3"`.
fn coerce_number(value: &Value, numbers: &dyn NumericParser) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix('-') {
                Some(rest) => numbers.parse(rest.trim_start()).map(|v| -v),
                None => numbers.parse(s.strip_prefix('+').unwrap_or(s)),
            }
        }
        _ => None,
    }
}

fn coerce_integer(value: &Value, numbers: &dyn NumericParser) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let v = coerce_number(value, numbers)?;
    (v.fract() == 0.0 && v.abs() < i64::MAX as f64).then_some(v as i64)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// First two sentences of the description, cut on a word boundary to the
/// length limit.
fn short_description(description: &SanitizedText) -> String {
    let sentences = split_sentences(description.as_str(), |_| false);
    let joined = sentences
        .iter()
        .take(SHORT_DESCRIPTION_SENTENCES)
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    truncate_words(&joined, SHORT_DESCRIPTION_MAX_CHARS)
}

fn truncate_words(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];
    // Keep the whole head when the limit falls right after a word.
    let head = if text[cut..].starts_with(char::is_whitespace) {
        head
    } else {
        head.rfind(char::is_whitespace).map(|i| &head[..i]).unwrap_or(head)
    };
    head.trim_end().to_string()
}

fn report_missing(record: &ProductRecord, diagnostics: &mut RecordDiagnostics) {
    let checks = [
        ("title", record.title.is_empty()),
        ("mainImageUrl", record.main_image_url.is_none()),
        ("dimensions", record.dimensions.is_empty()),
        ("weight", record.weight.is_empty()),
        ("material", record.material.is_empty()),
        ("colors", record.colors.is_empty()),
        ("keyFeatures", record.key_features.is_empty()),
        ("technicalSpecifications", record.technical_specifications.is_empty()),
        ("usageScenarios", record.usage_scenarios.is_empty()),
    ];
    for (name, missing) in checks {
        if missing {
            diagnostics.missing(name);
        }
    }
}

/// Remove duplicates from every list field, keeping first occurrences.
///
/// Comparison ignores case and whitespace runs. Specification keys keep their
/// first position and the last value. Blank entries are dropped and the
/// gallery never repeats the main image.
pub fn dedupe_lists(draft: &mut ProductDraft) {
    let record = &mut draft.record;
    dedupe_strings(&mut record.material);
    dedupe_strings(&mut record.colors);
    dedupe_strings(&mut record.key_features);
    dedupe_strings(&mut record.usage_scenarios);

    let mut specs: IndexMap<String, SpecEntry> = IndexMap::new();
    for entry in record.technical_specifications.drain(..) {
        let key = dedup_key(&entry.key);
        if key.is_empty() {
            continue;
        }
        specs.insert(key, entry);
    }
    record.technical_specifications = specs.into_values().collect();

    let mut seen: HashSet<String> = record.main_image_url.iter().cloned().collect();
    record.gallery_images.retain(|url| seen.insert(url.clone()));
}

fn dedupe_strings(items: &mut Vec<String>) {
    let mut seen = HashSet::new();
    items.retain(|item| {
        let key = dedup_key(item);
        !key.is_empty() && seen.insert(key)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{PipelineConfig, Vocabulary};
    use catalog_extract::{mine, sanitize, select_measurements, extract_measurements};
    use serde_json::json;

    struct Fixture {
        lexicon: Lexicon,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                lexicon: Lexicon::new(&Vocabulary::default(), &PipelineConfig::default()).unwrap(),
            }
        }

        fn assemble(&self, raw: serde_json::Value) -> (Result<ProductDraft>, RecordDiagnostics) {
            self.assemble_with(raw, None)
        }

        fn assemble_with(
            &self,
            raw: serde_json::Value,
            default_currency: Option<&str>,
        ) -> (Result<ProductDraft>, RecordDiagnostics) {
            let raw: RawProduct = serde_json::from_value(raw).unwrap();
            let title = sanitize(raw.title.as_deref().unwrap_or_default(), &self.lexicon);
            let description = sanitize(raw.description.as_deref().unwrap_or_default(), &self.lexicon);
            let mined = mine(&description, &title, &self.lexicon);
            let measurements = select_measurements(&extract_measurements(&description, &self.lexicon));
            let ctx = AssemblyContext {
                lexicon: &self.lexicon,
                default_currency,
            };
            let mut diagnostics = RecordDiagnostics::new(0);
            let draft = assemble(
                AssemblyInput {
                    raw: &raw,
                    title: &title,
                    description: &description,
                    mined: &mined,
                    measurements: &measurements,
                },
                &ctx,
                &mut diagnostics,
            );
            (draft, diagnostics)
        }
    }

    fn base() -> serde_json::Value {
        json!({
            "id": "p-1",
            "title": "Camping Lantern",
            "description": "<p>Bright lantern for the tent. Runs all night. Folds flat.</p><p>Size: 12 x 8 x 20 cm</p>",
            "vendor": "NoEnName_Null",
            "status": "ACTIVE",
            "price": "19.90",
            "currency": "ILS",
            "images": ["https://cdn/a.jpg", {"url": "https://cdn/a.jpg"}, {"url": "https://cdn/b.jpg"}, {"url": " "}],
            "variants": [{"id": 11, "title": "Black", "sku": "L-1", "price": "19.90", "inventory": "4"}]
        })
    }

    #[test]
    fn test_assemble_full_record() {
        let fixture = Fixture::new();
        let (draft, diag) = fixture.assemble(base());
        let draft = draft.unwrap();
        let record = &draft.record;

        assert_eq!(record.product_id, "p-1");
        assert_eq!(record.base_price, 19.9);
        assert_eq!(record.status, "active");
        assert_eq!(record.brand, "Unknown");
        assert!(draft.brand_is_generic);
        assert_eq!(record.short_description, "Bright lantern for the tent. Runs all night.");
        assert_eq!(record.main_image_url.as_deref(), Some("https://cdn/a.jpg"));
        assert_eq!(record.gallery_images, vec!["https://cdn/b.jpg"]);
        assert_eq!(record.dimensions.length, Some(12.0));
        assert_eq!(record.dimensions.height, Some(20.0));
        assert_eq!(record.dimensions.unit.as_deref(), Some("cm"));
        assert!(record.weight.is_empty());
        assert_eq!(record.variants[0].id, "11");
        assert_eq!(record.variants[0].inventory, 4);
        assert!(diag.missing_attributes.contains(&"weight".to_string()));
        assert!(diag.unrecognized_status.is_none());
    }

    #[test]
    fn test_required_fields() {
        let fixture = Fixture::new();

        let mut raw = base();
        raw["id"] = json!(null);
        let (err, _) = fixture.assemble(raw);
        assert!(matches!(err, Err(Error::MalformedInput { ref field, .. }) if field == "productId"));

        let mut raw = base();
        raw["currency"] = json!(null);
        let (err, _) = fixture.assemble(raw.clone());
        assert!(matches!(err, Err(Error::MalformedInput { ref field, .. }) if field == "currency"));
        let (draft, diag) = fixture.assemble_with(raw, Some("USD"));
        assert_eq!(draft.unwrap().record.currency, "USD");
        assert!(!diag.notes.is_empty());

        let mut raw = base();
        raw["status"] = json!("  ");
        let (err, _) = fixture.assemble(raw);
        assert!(matches!(err, Err(Error::MalformedInput { ref field, .. }) if field == "status"));

        let mut raw = base();
        raw["variants"][0]["price"] = json!("free");
        let (err, _) = fixture.assemble(raw);
        assert!(
            matches!(err, Err(Error::MalformedInput { ref field, .. }) if field == "variants[0].price")
        );
    }

    #[test]
    fn test_price_falls_back_to_first_variant() {
        let fixture = Fixture::new();
        let mut raw = base();
        raw["price"] = json!(null);
        raw["variants"][0]["price"] = json!(7.5);
        let (draft, diag) = fixture.assemble(raw);
        assert_eq!(draft.unwrap().record.base_price, 7.5);
        assert!(diag.notes.iter().any(|n| n.starts_with("basePrice")));

        let mut raw = base();
        raw["price"] = json!(null);
        raw["variants"] = json!([]);
        let (err, _) = fixture.assemble(raw);
        assert!(matches!(err, Err(Error::MalformedInput { ref field, .. }) if field == "price"));
    }

    #[test]
    fn test_blank_price_falls_back_to_first_variant() {
        let fixture = Fixture::new();
        let mut raw = base();
        raw["price"] = json!("  ");
        raw["variants"][0]["price"] = "12.00".into();
        let (draft, diag) = fixture.assemble(raw);
        assert_eq!(draft.unwrap().record.base_price, 12.0);
        assert!(diag.notes.iter().any(|n| n.starts_with("basePrice")));
    }

    #[test]
    fn test_unrecognized_status_passes_through() {
        let fixture = Fixture::new();
        let mut raw = base();
        raw["status"] = json!("PENDING_REVIEW");
        let (draft, diag) = fixture.assemble(raw);
        assert_eq!(draft.unwrap().record.status, "PENDING_REVIEW");
        assert_eq!(diag.unrecognized_status.as_deref(), Some("PENDING_REVIEW"));
    }

    #[test]
    fn test_variant_coercion() {
        let fixture = Fixture::new();
        let mut raw = base();
        raw["vendor"] = json!("Acme");
        raw["variants"] = json!([
            {"id": "a", "price": 5, "compareAtPrice": "n/a"},
            {"id": "b", "price": "-2", "compareAtPrice": "9.00", "inventory": 3.0}
        ]);
        let (draft, diag) = fixture.assemble(raw);
        let draft = draft.unwrap();
        let variants = &draft.record.variants;
        assert_eq!(draft.record.brand, "Acme");
        assert!(!draft.brand_is_generic);
        assert_eq!(variants[0].inventory, 0);
        assert_eq!(variants[0].compare_at_price, None);
        assert_eq!(variants[1].price, -2.0);
        assert_eq!(variants[1].compare_at_price, Some(9.0));
        assert_eq!(variants[1].inventory, 3);
        assert!(diag.notes.iter().any(|n| n.contains("variants[0].compareAtPrice")));
    }

    #[test]
    fn test_dedupe_lists() {
        let mut draft = ProductDraft::default();
        draft.record.material = vec!["steel".into(), "steel".into(), "Steel".into(), " ".into()];
        draft.record.technical_specifications = vec![
            SpecEntry::new("Power", "5W"),
            SpecEntry::new("Color", "Red"),
            SpecEntry::new("power", "10W"),
        ];
        draft.record.main_image_url = Some("a".into());
        draft.record.gallery_images = vec!["b".into(), "a".into(), "b".into()];
        dedupe_lists(&mut draft);

        assert_eq!(draft.record.material, vec!["steel"]);
        assert_eq!(
            draft.record.technical_specifications,
            vec![SpecEntry::new("power", "10W"), SpecEntry::new("Color", "Red")]
        );
        assert_eq!(draft.record.gallery_images, vec!["b"]);
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("short text", 300), "short text");
        assert_eq!(truncate_words("alpha beta gamma", 12), "alpha beta");
        assert_eq!(truncate_words("alpha beta gamma", 10), "alpha beta");
        assert_eq!(truncate_words("unbreakableword", 5), "unbre");
    }
}
