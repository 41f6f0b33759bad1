//! Vocabulary and taxonomy tables consumed by the extractors.
//!
//! Everything the sanitizer and miners match against lives here as data.
//! The built-in tables cover English storefront text; a JSON file can replace
//! any subset of them (missing keys keep their defaults).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Measurement system a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Metric,
    Imperial,
    Unknown,
}

/// Physical quantity a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Length,
    Mass,
    Volume,
}

/// A canonical unit code and the spellings that resolve to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub code: String,
    pub kind: UnitKind,
    pub system: UnitSystem,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategoryNode {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A top-level category with its keyword phrases and sub-categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub subcategories: Vec<SubCategoryNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vocabulary {
    /// Whole lines dropped by the sanitizer (normalized or fuzzy match).
    pub boilerplate_phrases: Vec<String>,
    /// `key: value` lines whose key is listed here are dropped entirely.
    pub boilerplate_keys: Vec<String>,
    /// Lines containing any of these tokens are dropped.
    pub boilerplate_tokens: Vec<String>,
    /// Section headings removed when they stand alone on a line.
    pub heading_tokens: Vec<String>,
    /// Specification keys that never carry product information.
    pub spec_key_blocklist: Vec<String>,
    /// Specification values meaning "nothing here".
    pub placeholder_values: Vec<String>,
    pub materials: Vec<String>,
    pub colors: Vec<String>,
    pub feature_indicators: Vec<String>,
    /// Leading verbs that mark imperative or benefit phrasing.
    pub feature_verbs: Vec<String>,
    pub usage_indicators: Vec<String>,
    pub categories: Vec<CategoryNode>,
    pub units: Vec<UnitDefinition>,
    /// Display label per canonical unit code, applied at localization time.
    pub unit_labels: BTreeMap<String, String>,
    /// Raw status code → canonical status token.
    pub status_map: BTreeMap<String, String>,
    /// Vendor value that means the supplier did not provide a brand.
    pub unknown_vendor: String,
    /// Brand written in place of the unknown vendor sentinel.
    pub unknown_brand: String,
}

impl Vocabulary {
    /// Load a vocabulary file, filling absent tables from the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let vocabulary: Vocabulary = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("invalid vocabulary file {}: {}", path.display(), e))
        })?;
        info!(
            "Loaded vocabulary from {} ({} materials, {} colors, {} categories)",
            path.display(),
            vocabulary.materials.len(),
            vocabulary.colors.len(),
            vocabulary.categories.len()
        );
        Ok(vocabulary)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn category(name: &str, keywords: &[&str], subs: &[(&str, &[&str])]) -> CategoryNode {
    CategoryNode {
        name: name.to_string(),
        keywords: strings(keywords),
        subcategories: subs
            .iter()
            .map(|(sub, kws)| SubCategoryNode {
                name: sub.to_string(),
                keywords: strings(kws),
            })
            .collect(),
    }
}

fn unit(code: &str, kind: UnitKind, system: UnitSystem, aliases: &[&str]) -> UnitDefinition {
    UnitDefinition {
        code: code.to_string(),
        kind,
        system,
        aliases: strings(aliases),
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        use UnitKind::*;
        use UnitSystem::*;

        Self {
            boilerplate_phrases: strings(&[
                "Origin: Mainland China",
                "Origin: CN(Origin)",
                "100% brand new and high quality",
                "Brand new and high quality",
                "Please allow 1-3cm differences due to manual measurement",
                "Please allow 1-2cm error due to manual measurement",
                "Due to the light and screen difference, the item's color may be slightly different from the pictures",
                "Thanks for your understanding",
                "Please understand",
            ]),
            boilerplate_keys: strings(&[
                "brand name",
                "origin",
                "choice",
                "semi_choice",
                "high-concerned chemical",
                "is_customized",
                "cn",
            ]),
            boilerplate_tokens: strings(&["NoEnName_Null"]),
            heading_tokens: strings(&[
                "specifications",
                "specification",
                "description",
                "product description",
                "features",
                "feature",
                "key features",
                "details",
                "product details",
                "overview",
                "package includes",
                "package content",
                "packing list",
            ]),
            spec_key_blocklist: strings(&[
                "brand name",
                "brand",
                "origin",
                "choice",
                "semi_choice",
                "high-concerned chemical",
                "is_customized",
            ]),
            placeholder_values: strings(&["noenname_null", "none", "null", "n/a", "na", "-"]),
            materials: strings(&[
                "stainless steel", "carbon steel", "steel", "aluminum alloy", "aluminium alloy",
                "aluminum", "aluminium", "zinc alloy", "alloy", "iron", "copper", "brass",
                "titanium", "carbon fiber", "plastic", "abs", "pvc", "polypropylene", "silicone",
                "rubber", "tempered glass", "glass", "ceramic", "porcelain", "wood", "bamboo",
                "cotton", "polyester", "nylon", "pu leather", "faux leather", "leather", "wool",
                "linen", "silk", "velvet", "fabric", "canvas", "denim", "spandex", "acrylic",
                "resin", "marble", "stone", "paper", "memory foam", "foam",
            ]),
            colors: strings(&[
                "black", "white", "red", "wine red", "blue", "navy blue", "sky blue", "dark blue",
                "light blue", "green", "army green", "dark green", "yellow", "orange", "purple",
                "pink", "rose gold", "gold", "silver", "brown", "coffee", "beige", "khaki", "gray",
                "grey", "ivory", "turquoise", "transparent", "multicolor",
            ]),
            feature_indicators: strings(&[
                "easy", "durable", "waterproof", "portable", "lightweight", "adjustable",
                "comfortable", "high quality", "premium", "safe", "sturdy", "foldable",
                "rechargeable", "multifunctional", "convenient", "efficient", "powerful", "soft",
                "breathable", "non-slip", "anti-slip", "long-lasting", "compact", "stable",
                "reusable", "strong", "upgraded", "ergonomic", "washable", "eco-friendly",
                "made of", "made from",
            ]),
            feature_verbs: strings(&[
                "enjoy", "keep", "keeps", "make", "makes", "protect", "protects", "save", "saves",
                "add", "use", "get", "provide", "provides", "help", "helps", "allow", "allows",
                "let", "lets", "ensure", "ensures", "offer", "offers", "support", "supports",
                "features", "perfect", "ideal",
            ]),
            usage_indicators: strings(&[
                "ideal for", "perfect for", "suitable for", "great for", "good for", "used for",
                "designed for", "applicable to", "widely used in", "use it for",
            ]),
            categories: vec![
                category(
                    "Home & Kitchen",
                    &["home", "kitchen", "household", "cookware", "furniture"],
                    &[
                        ("Kitchen Tools", &["kitchen", "cooking", "knife", "spatula", "cutting board", "utensil", "pan", "pot"]),
                        ("Storage & Organization", &["storage", "organizer", "box", "rack", "shelf", "basket", "hook"]),
                        ("Home Decor", &["decor", "decoration", "vase", "frame", "wall art", "candle", "curtain"]),
                        ("Bedding", &["pillow", "bedding", "blanket", "bed sheet", "mattress"]),
                    ],
                ),
                category(
                    "Electronics",
                    &["electronic", "usb", "bluetooth", "wireless", "battery"],
                    &[
                        ("Phone Accessories", &["phone", "phone case", "charger", "cable", "screen protector", "phone holder"]),
                        ("Audio", &["earphone", "headphone", "speaker", "earbud", "audio"]),
                        ("Lighting", &["led", "lamp", "light", "lantern", "flashlight", "bulb"]),
                        ("Smart Gadgets", &["smart", "sensor", "remote control", "gadget"]),
                    ],
                ),
                category(
                    "Sports & Outdoors",
                    &["outdoor", "sport", "camping", "hiking", "fitness"],
                    &[
                        ("Camping & Hiking", &["camping", "hiking", "tent", "sleeping bag", "trekking"]),
                        ("Fitness", &["fitness", "yoga", "gym", "workout", "exercise", "dumbbell"]),
                        ("Cycling", &["bike", "bicycle", "cycling"]),
                        ("Fishing", &["fishing", "fishing rod", "lure", "reel"]),
                    ],
                ),
                category(
                    "Fashion",
                    &["clothing", "fashion", "apparel", "wear"],
                    &[
                        ("Women's Clothing", &["women", "dress", "skirt", "blouse"]),
                        ("Men's Clothing", &["men", "shirt", "jacket", "trousers"]),
                        ("Bags & Wallets", &["bag", "backpack", "wallet", "purse", "handbag"]),
                        ("Jewelry", &["necklace", "ring", "bracelet", "earring", "jewelry"]),
                    ],
                ),
                category(
                    "Beauty & Health",
                    &["beauty", "health", "skin care", "personal care"],
                    &[
                        ("Skin Care", &["skin", "face", "cream", "serum", "mask"]),
                        ("Hair Care", &["hair", "comb", "hair brush", "shampoo"]),
                        ("Makeup", &["makeup", "lipstick", "cosmetic", "eyeliner"]),
                        ("Personal Care", &["massage", "massager", "toothbrush", "shaver"]),
                    ],
                ),
                category(
                    "Toys & Kids",
                    &["toy", "kids", "children", "baby"],
                    &[
                        ("Toys", &["toy", "puzzle", "doll", "game"]),
                        ("Baby Care", &["baby", "infant", "feeding", "diaper"]),
                    ],
                ),
                category(
                    "Pet Supplies",
                    &["pet", "dog", "cat"],
                    &[
                        ("Dog Supplies", &["dog", "puppy", "leash", "collar"]),
                        ("Cat Supplies", &["cat", "kitten", "litter", "scratcher"]),
                    ],
                ),
                category(
                    "Automotive",
                    &["car", "vehicle", "auto", "motorcycle"],
                    &[
                        ("Car Accessories", &["car", "car seat", "steering wheel", "dashboard"]),
                        ("Motorcycle", &["motorcycle", "helmet"]),
                    ],
                ),
                category(
                    "Tools & Home Improvement",
                    &["tool", "repair", "drill", "garden"],
                    &[
                        ("Hand Tools", &["screwdriver", "wrench", "plier", "hammer", "tool"]),
                        ("Garden", &["garden", "plant", "watering", "hose"]),
                    ],
                ),
            ],
            units: vec![
                unit("mm", Length, Metric, &["mm", "millimeter", "millimeters", "millimetre", "millimetres"]),
                unit("cm", Length, Metric, &["cm", "cms", "centimeter", "centimeters", "centimetre", "centimetres"]),
                unit("m", Length, Metric, &["m", "meter", "meters", "metre", "metres"]),
                unit("in", Length, Imperial, &["in", "inch", "inches", "\"", "″", "”"]),
                unit("ft", Length, Imperial, &["ft", "foot", "feet", "′"]),
                unit("mg", Mass, Metric, &["mg", "milligram", "milligrams"]),
                unit("g", Mass, Metric, &["g", "gr", "gram", "grams", "gramme", "grammes"]),
                unit("kg", Mass, Metric, &["kg", "kgs", "kilo", "kilos", "kilogram", "kilograms"]),
                unit("lb", Mass, Imperial, &["lb", "lbs", "pound", "pounds"]),
                unit("oz", Mass, Imperial, &["oz", "ounce", "ounces"]),
                unit("ml", Volume, Metric, &["ml", "milliliter", "milliliters", "millilitre", "millilitres"]),
                unit("l", Volume, Metric, &["l", "liter", "liters", "litre", "litres"]),
                unit("gal", Volume, Imperial, &["gal", "gallon", "gallons"]),
            ],
            unit_labels: BTreeMap::new(),
            status_map: [("active", "active"), ("draft", "draft"), ("archived", "archived")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            unknown_vendor: "NoEnName_Null".to_string(),
            unknown_brand: "Unknown".to_string(),
        }
    }
}
