//! Raw input records and the canonical output schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A product as exported by the storefront. Read once, never mutated.
///
/// Numeric fields stay untyped so the assembler decides how to coerce them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(default)]
    pub id: Option<Value>,
    /// Document id used by some exports instead of (or next to) `id`.
    #[serde(default, rename = "_id")]
    pub legacy_id: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "body_html")]
    pub description: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default, alias = "product_type")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub variants: Vec<RawVariant>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl RawProduct {
    /// Product identifier, preferring `id` over `_id`. Numbers are stringified.
    pub fn identifier(&self) -> Option<String> {
        self.id
            .as_ref()
            .and_then(value_to_string)
            .or_else(|| self.legacy_id.as_ref().and_then(value_to_string))
    }
}

/// An image entry: either a bare URL or an object carrying one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawImage {
    Url(String),
    Object {
        #[serde(default, alias = "src")]
        url: Option<String>,
        #[serde(default, rename = "altText", alias = "alt")]
        alt_text: Option<String>,
    },
}

impl RawImage {
    pub fn url(&self) -> Option<&str> {
        let url = match self {
            Self::Url(url) => Some(url.as_str()),
            Self::Object { url, .. } => url.as_deref(),
        };
        url.map(str::trim).filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariant {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default, alias = "compare_at_price")]
    pub compare_at_price: Option<Value>,
    #[serde(default, alias = "inventory_quantity")]
    pub inventory: Option<Value>,
}

/// Render a JSON scalar as an identifier string.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A `{key, value}` technical specification entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    pub key: String,
    pub value: String,
}

impl SpecEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub unit: Option<String>,
}

impl Dimensions {
    pub fn is_empty(&self) -> bool {
        self.length.is_none() && self.width.is_none() && self.height.is_none() && self.unit.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub value: Option<f64>,
    pub unit: Option<String>,
}

impl Weight {
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.unit.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub title: String,
    pub sku: String,
    pub price: f64,
    pub compare_at_price: Option<f64>,
    pub inventory: i64,
}

/// The canonical product shape written to the output collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub product_id: String,
    pub title: String,
    pub short_description: String,
    pub long_description: String,
    pub main_image_url: Option<String>,
    pub gallery_images: Vec<String>,
    pub brand: String,
    pub category: String,
    pub sub_category: String,
    pub key_features: Vec<String>,
    pub technical_specifications: Vec<SpecEntry>,
    pub dimensions: Dimensions,
    pub weight: Weight,
    pub material: Vec<String>,
    pub colors: Vec<String>,
    pub variants: Vec<Variant>,
    pub base_price: f64,
    pub currency: String,
    pub status: String,
    pub usage_scenarios: Vec<String>,
}

/// A record that has been assembled but not yet validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub record: ProductRecord,
    /// Brand was replaced by the unknown-brand marker and may be localized.
    pub brand_is_generic: bool,
}

/// Normalization used for duplicate detection across list fields.
pub fn dedup_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
