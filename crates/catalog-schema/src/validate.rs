//! Invariant checks that turn a draft into a [`CanonicalProduct`].

use std::collections::HashSet;

use catalog_core::{dedup_key, ProductDraft, ProductRecord, ValidationError, ValidationRule};
use serde::Serialize;

/// A product record that passed validation. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalProduct(ProductRecord);

impl CanonicalProduct {
    pub fn record(&self) -> &ProductRecord {
        &self.0
    }

    pub fn product_id(&self) -> &str {
        &self.0.product_id
    }

    pub fn into_record(self) -> ProductRecord {
        self.0
    }
}

impl AsRef<ProductRecord> for CanonicalProduct {
    fn as_ref(&self) -> &ProductRecord {
        &self.0
    }
}

type Check = Result<(), ValidationError>;

fn fail(field: impl Into<String>, rule: ValidationRule) -> Check {
    Err(ValidationError::new(field, rule))
}

fn required(field: &str, value: &str) -> Check {
    if value.trim().is_empty() {
        return fail(field, ValidationRule::Required);
    }
    Ok(())
}

fn amount(field: &str, value: f64) -> Check {
    if !value.is_finite() {
        return fail(field, ValidationRule::NotFinite);
    }
    if value < 0.0 {
        return fail(field, ValidationRule::Negative);
    }
    Ok(())
}

fn unique<'a>(field: &str, items: impl IntoIterator<Item = &'a str>) -> Check {
    let mut seen = HashSet::new();
    for (i, item) in items.into_iter().enumerate() {
        if !seen.insert(dedup_key(item)) {
            return fail(format!("{}[{}]", field, i), ValidationRule::Duplicate);
        }
    }
    Ok(())
}

/// Check every record invariant in a fixed order; the first violation wins.
pub fn validate(draft: ProductDraft) -> Result<CanonicalProduct, ValidationError> {
    let record = draft.record;

    required("productId", &record.product_id)?;
    amount("basePrice", record.base_price)?;
    required("currency", &record.currency)?;
    required("status", &record.status)?;
    required("category", &record.category)?;
    required("subCategory", &record.sub_category)?;

    check_dimensions(&record)?;
    check_weight(&record)?;
    check_variants(&record)?;
    check_images(&record)?;

    unique("material", record.material.iter().map(String::as_str))?;
    unique("colors", record.colors.iter().map(String::as_str))?;
    unique("keyFeatures", record.key_features.iter().map(String::as_str))?;
    unique("usageScenarios", record.usage_scenarios.iter().map(String::as_str))?;
    unique(
        "technicalSpecifications",
        record.technical_specifications.iter().map(|s| s.key.as_str()),
    )?;

    Ok(CanonicalProduct(record))
}

fn check_dimensions(record: &ProductRecord) -> Check {
    let d = &record.dimensions;
    for (name, value) in [("length", d.length), ("width", d.width), ("height", d.height)] {
        if let Some(v) = value {
            amount(&format!("dimensions.{}", name), v)?;
        }
    }
    match d.unit.as_deref() {
        None if d.length.is_some() || d.width.is_some() || d.height.is_some() => {
            fail("dimensions.unit", ValidationRule::IncompleteGroup)
        }
        None => Ok(()),
        Some(unit) if unit.trim().is_empty() => fail("dimensions.unit", ValidationRule::Required),
        Some(_) if d.length.is_none() => fail("dimensions.length", ValidationRule::IncompleteGroup),
        Some(_) if d.width.is_none() => fail("dimensions.width", ValidationRule::IncompleteGroup),
        Some(_) => Ok(()),
    }
}

fn check_weight(record: &ProductRecord) -> Check {
    let w = &record.weight;
    match (w.value, w.unit.as_deref()) {
        (None, None) => Ok(()),
        (Some(v), Some(unit)) => {
            amount("weight.value", v)?;
            required("weight.unit", unit)
        }
        (Some(_), None) => fail("weight.unit", ValidationRule::IncompleteGroup),
        (None, Some(_)) => fail("weight.value", ValidationRule::IncompleteGroup),
    }
}

fn check_variants(record: &ProductRecord) -> Check {
    let mut ids = HashSet::new();
    let mut skus = HashSet::new();
    for (i, v) in record.variants.iter().enumerate() {
        let field = |name: &str| format!("variants[{}].{}", i, name);
        required(&field("id"), &v.id)?;
        amount(&field("price"), v.price)?;
        if let Some(compare_at) = v.compare_at_price {
            amount(&field("compareAtPrice"), compare_at)?;
        }
        if v.inventory < 0 {
            return fail(field("inventory"), ValidationRule::Negative);
        }
        if !ids.insert(v.id.as_str()) {
            return fail(field("id"), ValidationRule::Duplicate);
        }
        // Blank SKUs are common on single-variant products.
        if !v.sku.is_empty() && !skus.insert(v.sku.as_str()) {
            return fail(field("sku"), ValidationRule::Duplicate);
        }
    }
    Ok(())
}

fn check_images(record: &ProductRecord) -> Check {
    match record.main_image_url.as_deref() {
        None if !record.gallery_images.is_empty() => {
            return fail("galleryImages", ValidationRule::GalleryWithoutMain);
        }
        Some(main) => {
            if let Some(i) = record.gallery_images.iter().position(|url| url == main) {
                return fail(format!("galleryImages[{}]", i), ValidationRule::GalleryContainsMain);
            }
        }
        None => {}
    }
    let mut seen = HashSet::new();
    for (i, url) in record.gallery_images.iter().enumerate() {
        if !seen.insert(url.as_str()) {
            return fail(format!("galleryImages[{}]", i), ValidationRule::Duplicate);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{Dimensions, SpecEntry, Variant, Weight};

    fn valid() -> ProductDraft {
        let record = ProductRecord {
            product_id: "p-1".into(),
            title: "Lantern".into(),
            brand: "Acme".into(),
            category: "Electronics".into(),
            sub_category: "Lighting".into(),
            base_price: 10.0,
            currency: "ILS".into(),
            status: "active".into(),
            main_image_url: Some("https://cdn/a.jpg".into()),
            gallery_images: vec!["https://cdn/b.jpg".into()],
            dimensions: Dimensions {
                length: Some(30.0),
                width: Some(20.0),
                height: None,
                unit: Some("cm".into()),
            },
            variants: vec![
                Variant {
                    id: "1".into(),
                    title: "Black".into(),
                    sku: String::new(),
                    price: 10.0,
                    compare_at_price: Some(12.0),
                    inventory: 3,
                },
                Variant {
                    id: "2".into(),
                    title: "White".into(),
                    sku: String::new(),
                    price: 10.0,
                    compare_at_price: None,
                    inventory: 0,
                },
            ],
            ..Default::default()
        };
        ProductDraft {
            record,
            brand_is_generic: false,
        }
    }

    fn rule_of(draft: ProductDraft) -> (String, ValidationRule) {
        let err = validate(draft).unwrap_err();
        (err.field, err.rule)
    }

    #[test]
    fn test_valid_record_passes() {
        let product = validate(valid()).unwrap();
        assert_eq!(product.product_id(), "p-1");
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["productId"], "p-1");
        assert!(json["weight"]["value"].is_null());
    }

    #[test]
    fn test_required_and_amounts() {
        let mut draft = valid();
        draft.record.product_id = " ".into();
        assert_eq!(rule_of(draft), ("productId".into(), ValidationRule::Required));

        let mut draft = valid();
        draft.record.base_price = -1.0;
        assert_eq!(rule_of(draft), ("basePrice".into(), ValidationRule::Negative));

        let mut draft = valid();
        draft.record.base_price = f64::NAN;
        assert_eq!(rule_of(draft), ("basePrice".into(), ValidationRule::NotFinite));

        let mut draft = valid();
        draft.record.sub_category = String::new();
        assert_eq!(rule_of(draft), ("subCategory".into(), ValidationRule::Required));
    }

    #[test]
    fn test_measurement_groups() {
        let mut draft = valid();
        draft.record.dimensions.unit = None;
        assert_eq!(rule_of(draft), ("dimensions.unit".into(), ValidationRule::IncompleteGroup));

        let mut draft = valid();
        draft.record.dimensions.width = None;
        assert_eq!(rule_of(draft), ("dimensions.width".into(), ValidationRule::IncompleteGroup));

        let mut draft = valid();
        draft.record.weight = Weight {
            value: Some(1.0),
            unit: None,
        };
        assert_eq!(rule_of(draft), ("weight.unit".into(), ValidationRule::IncompleteGroup));

        let mut draft = valid();
        draft.record.dimensions = Dimensions::default();
        assert!(validate(draft).is_ok());
    }

    #[test]
    fn test_variant_rules() {
        let mut draft = valid();
        draft.record.variants[1].id = "1".into();
        assert_eq!(rule_of(draft), ("variants[1].id".into(), ValidationRule::Duplicate));

        let mut draft = valid();
        draft.record.variants[0].sku = "SKU".into();
        draft.record.variants[1].sku = "SKU".into();
        assert_eq!(rule_of(draft), ("variants[1].sku".into(), ValidationRule::Duplicate));

        let mut draft = valid();
        draft.record.variants[0].inventory = -1;
        assert_eq!(rule_of(draft), ("variants[0].inventory".into(), ValidationRule::Negative));

        let mut draft = valid();
        draft.record.variants[1].compare_at_price = Some(f64::INFINITY);
        assert_eq!(
            rule_of(draft),
            ("variants[1].compareAtPrice".into(), ValidationRule::NotFinite)
        );
    }

    #[test]
    fn test_gallery_rules() {
        let mut draft = valid();
        draft.record.gallery_images.push("https://cdn/a.jpg".into());
        assert_eq!(
            rule_of(draft),
            ("galleryImages[1]".into(), ValidationRule::GalleryContainsMain)
        );

        let mut draft = valid();
        draft.record.main_image_url = None;
        assert_eq!(rule_of(draft), ("galleryImages".into(), ValidationRule::GalleryWithoutMain));
    }

    #[test]
    fn test_list_duplicates() {
        let mut draft = valid();
        draft.record.material = vec!["steel".into(), " Steel".into()];
        assert_eq!(rule_of(draft), ("material[1]".into(), ValidationRule::Duplicate));

        let mut draft = valid();
        draft.record.technical_specifications =
            vec![SpecEntry::new("Power", "5W"), SpecEntry::new("POWER", "6W")];
        assert_eq!(
            rule_of(draft),
            ("technicalSpecifications[1]".into(), ValidationRule::Duplicate)
        );
    }
}
