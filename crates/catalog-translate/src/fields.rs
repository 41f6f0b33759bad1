//! Addressable text fields of a product record.

use std::fmt;

use catalog_core::{ProductDraft, ProductRecord};

/// A translatable text slot in a [`ProductRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Title,
    ShortDescription,
    LongDescription,
    KeyFeature(usize),
    SpecKey(usize),
    SpecValue(usize),
    Material(usize),
    Color(usize),
    DimensionsUnit,
    WeightUnit,
    UsageScenario(usize),
    VariantTitle(usize),
    Brand,
    Category,
    SubCategory,
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::ShortDescription => write!(f, "shortDescription"),
            Self::LongDescription => write!(f, "longDescription"),
            Self::KeyFeature(i) => write!(f, "keyFeatures[{}]", i),
            Self::SpecKey(i) => write!(f, "technicalSpecifications[{}].key", i),
            Self::SpecValue(i) => write!(f, "technicalSpecifications[{}].value", i),
            Self::Material(i) => write!(f, "material[{}]", i),
            Self::Color(i) => write!(f, "colors[{}]", i),
            Self::DimensionsUnit => write!(f, "dimensions.unit"),
            Self::WeightUnit => write!(f, "weight.unit"),
            Self::UsageScenario(i) => write!(f, "usageScenarios[{}]", i),
            Self::VariantTitle(i) => write!(f, "variants[{}].title", i),
            Self::Brand => write!(f, "brand"),
            Self::Category => write!(f, "category"),
            Self::SubCategory => write!(f, "subCategory"),
        }
    }
}

impl TextField {
    pub fn is_unit(&self) -> bool {
        matches!(self, Self::DimensionsUnit | Self::WeightUnit)
    }

    pub fn get<'a>(&self, record: &'a ProductRecord) -> Option<&'a str> {
        let text = match *self {
            Self::Title => &record.title,
            Self::ShortDescription => &record.short_description,
            Self::LongDescription => &record.long_description,
            Self::KeyFeature(i) => record.key_features.get(i)?,
            Self::SpecKey(i) => &record.technical_specifications.get(i)?.key,
            Self::SpecValue(i) => &record.technical_specifications.get(i)?.value,
            Self::Material(i) => record.material.get(i)?,
            Self::Color(i) => record.colors.get(i)?,
            Self::DimensionsUnit => record.dimensions.unit.as_ref()?,
            Self::WeightUnit => record.weight.unit.as_ref()?,
            Self::UsageScenario(i) => record.usage_scenarios.get(i)?,
            Self::VariantTitle(i) => &record.variants.get(i)?.title,
            Self::Brand => &record.brand,
            Self::Category => &record.category,
            Self::SubCategory => &record.sub_category,
        };
        Some(text.as_str())
    }

    pub fn get_mut<'a>(&self, record: &'a mut ProductRecord) -> Option<&'a mut String> {
        let slot = match *self {
            Self::Title => &mut record.title,
            Self::ShortDescription => &mut record.short_description,
            Self::LongDescription => &mut record.long_description,
            Self::KeyFeature(i) => record.key_features.get_mut(i)?,
            Self::SpecKey(i) => &mut record.technical_specifications.get_mut(i)?.key,
            Self::SpecValue(i) => &mut record.technical_specifications.get_mut(i)?.value,
            Self::Material(i) => record.material.get_mut(i)?,
            Self::Color(i) => record.colors.get_mut(i)?,
            Self::DimensionsUnit => record.dimensions.unit.as_mut()?,
            Self::WeightUnit => record.weight.unit.as_mut()?,
            Self::UsageScenario(i) => record.usage_scenarios.get_mut(i)?,
            Self::VariantTitle(i) => &mut record.variants.get_mut(i)?.title,
            Self::Brand => &mut record.brand,
            Self::Category => &mut record.category,
            Self::SubCategory => &mut record.sub_category,
        };
        Some(slot)
    }
}

/// Every designated field of the draft that holds non-blank text.
///
/// The brand is included only when it is the generic unknown-brand marker.
pub fn translatable_fields(draft: &ProductDraft) -> Vec<TextField> {
    let record = &draft.record;
    let mut fields = vec![
        TextField::Title,
        TextField::ShortDescription,
        TextField::LongDescription,
    ];
    fields.extend((0..record.key_features.len()).map(TextField::KeyFeature));
    for i in 0..record.technical_specifications.len() {
        fields.push(TextField::SpecKey(i));
        fields.push(TextField::SpecValue(i));
    }
    fields.extend((0..record.material.len()).map(TextField::Material));
    fields.extend((0..record.colors.len()).map(TextField::Color));
    fields.push(TextField::DimensionsUnit);
    fields.push(TextField::WeightUnit);
    fields.extend((0..record.usage_scenarios.len()).map(TextField::UsageScenario));
    fields.extend((0..record.variants.len()).map(TextField::VariantTitle));
    if draft.brand_is_generic {
        fields.push(TextField::Brand);
    }
    fields.push(TextField::Category);
    fields.push(TextField::SubCategory);

    fields.retain(|field| {
        field
            .get(record)
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    });
    fields
}
