//! Dimension and weight extraction.
//!
//! Candidates are collected from three shapes of expression:
//! - products: `30 x 20 x 10 cm`, `12" x 8"`, `30cm×20cm`
//! - labelled values: `Length: 30 cm`, `Height 10cm`
//! - standalone quantities: `1.2 kg`, `500ml`
//!
//! [`select_measurements`] then picks one dimensions group and one weight.

use std::collections::BTreeMap;

use catalog_core::{UnitKind, UnitSystem};
use once_cell::sync::Lazy;
use regex::{Captures, Match, Regex};
use serde::Serialize;
use tracing::debug;

use crate::lexicon::{Lexicon, UnitInfo};
use crate::numeric::NumericParser;
use crate::sanitize::SanitizedText;

const NUMBER: &str = r"\d+(?:[.,]\d+)*";
/// A letter run not starting with `x` (the product sign), or an inch/foot mark.
const UNIT: &str = r#"(?:[\p{L}&&[^xX]]\p{L}*\.?|["″”′])"#;

static PRODUCT_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?P<n1>{n})\s*(?P<u1>{u})?\s*[xX×*]\s*(?P<n2>{n})\s*(?P<u2>{u})?(?:\s*[xX×*]\s*(?P<n3>{n})\s*(?P<u3>{u})?)?",
        n = NUMBER,
        u = UNIT
    ))
    .unwrap()
});

static LABELLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?P<label>length|width|height|depth)\b\s*(?:\([^)]*\)\s*)?[:：=]?\s*(?P<n>{n})\s*(?P<u>{u})",
        n = NUMBER,
        u = UNIT
    ))
    .unwrap()
});

static QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?P<n>{n})\s*(?P<u>{u})", n = NUMBER, u = UNIT)).unwrap()
});

/// Which measurement slot a candidate fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionType {
    Length,
    Width,
    Height,
    Weight,
}

/// A number with a recognized unit found in product text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementCandidate {
    pub dimension_type: DimensionType,
    pub value: f64,
    /// Canonical unit code.
    pub unit: String,
    pub unit_system: UnitSystem,
    pub unit_kind: UnitKind,
    /// Byte offset of the number in the searched text.
    pub source_offset: usize,
    /// Candidates with the same id were read from one expression.
    pub expression: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedDimensions {
    pub length: f64,
    pub width: f64,
    pub height: Option<f64>,
    pub unit: String,
    pub system: UnitSystem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedWeight {
    pub value: f64,
    pub unit: String,
    pub system: UnitSystem,
}

/// The measurements chosen for a product and how ties were resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementSelection {
    pub dimensions: Option<SelectedDimensions>,
    pub weight: Option<SelectedWeight>,
    pub notes: Vec<String>,
}

/// Collect measurement candidates using the lexicon's numeric locale.
pub fn extract_measurements(text: &SanitizedText, lexicon: &Lexicon) -> Vec<MeasurementCandidate> {
    extract_measurements_with(text, lexicon, lexicon.numeric_parser())
}

/// Collect candidates from several texts read as one document, in order.
///
/// Expression ids stay unique across texts and offsets are shifted so a later
/// text always sorts after an earlier one.
pub fn extract_measurements_from(texts: &[&SanitizedText], lexicon: &Lexicon) -> Vec<MeasurementCandidate> {
    let mut all = Vec::new();
    let mut expression_base = 0usize;
    let mut offset_base = 0usize;
    for text in texts {
        let found = extract_measurements(text, lexicon);
        let used = found.iter().map(|c| c.expression + 1).max().unwrap_or(0);
        all.extend(found.into_iter().map(|mut c| {
            c.expression += expression_base;
            c.source_offset += offset_base;
            c
        }));
        expression_base += used;
        offset_base += text.as_str().len() + 1;
    }
    all
}

/// Collect measurement candidates, ordered by source offset.
pub fn extract_measurements_with(
    text: &SanitizedText,
    lexicon: &Lexicon,
    numbers: &dyn NumericParser,
) -> Vec<MeasurementCandidate> {
    let text = text.as_str();
    let mut candidates = Vec::new();
    let mut next_expression = 0usize;

    // Products of two or three numbers.
    for caps in PRODUCT_EXPR.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if !standalone(text, whole.start(), whole.end()) {
            continue;
        }
        if let Some(found) = read_product(&caps, lexicon, numbers, next_expression) {
            candidates.extend(found);
            next_expression += 1;
        }
    }

    // Labelled dimensions, grouped by unit so `Length: 30 cm` and
    // `Width: 20 cm` on separate lines form one expression.
    let mut labelled_groups: BTreeMap<String, Vec<MeasurementCandidate>> = BTreeMap::new();
    for caps in LABELLED.captures_iter(text) {
        let (Some(label), Some(n), Some(u)) = (caps.name("label"), caps.name("n"), caps.name("u"))
        else {
            continue;
        };
        if !standalone(text, n.start(), u.end()) {
            continue;
        }
        let Some(unit) = lexicon.unit(u.as_str()).filter(|u| u.kind == UnitKind::Length) else {
            continue;
        };
        let Some(value) = numbers.parse(n.as_str()) else { continue };
        let dimension_type = match label.as_str().to_lowercase().as_str() {
            "length" => DimensionType::Length,
            "width" => DimensionType::Width,
            _ => DimensionType::Height,
        };
        let group = labelled_groups.entry(unit.code.clone()).or_default();
        if group.iter().any(|c| c.dimension_type == dimension_type) {
            continue;
        }
        group.push(candidate(dimension_type, value, unit, n.start(), 0));
    }
    for (_, mut group) in labelled_groups {
        for c in group.iter_mut() {
            c.expression = next_expression;
        }
        candidates.extend(group);
        next_expression += 1;
    }

    // Standalone mass and volume quantities.
    for caps in QUANTITY.captures_iter(text) {
        let (Some(n), Some(u)) = (caps.name("n"), caps.name("u")) else { continue };
        if !standalone(text, n.start(), u.end()) {
            continue;
        }
        let Some(unit) = lexicon
            .unit(u.as_str())
            .filter(|u| matches!(u.kind, UnitKind::Mass | UnitKind::Volume))
        else {
            continue;
        };
        let Some(value) = numbers.parse(n.as_str()) else { continue };
        candidates.push(candidate(
            DimensionType::Weight,
            value,
            unit,
            n.start(),
            next_expression,
        ));
        next_expression += 1;
    }

    candidates.sort_by_key(|c| (c.source_offset, c.expression));
    candidates
}

fn read_product(
    caps: &Captures<'_>,
    lexicon: &Lexicon,
    numbers: &dyn NumericParser,
    expression: usize,
) -> Option<Vec<MeasurementCandidate>> {
    let slots: Vec<(Match<'_>, Option<Match<'_>>)> = [("n1", "u1"), ("n2", "u2"), ("n3", "u3")]
        .iter()
        .filter_map(|(n, u)| caps.name(n).map(|m| (m, caps.name(u))))
        .collect();

    // Letter runs that are not units (`30 x 20 pieces`) are ignored; a
    // recognized unit of another kind disqualifies the expression.
    let mut unit: Option<&UnitInfo> = None;
    for (_, token) in &slots {
        let Some(token) = token else { continue };
        let Some(info) = lexicon.unit(token.as_str()) else { continue };
        if info.kind != UnitKind::Length {
            return None;
        }
        match unit {
            Some(existing) if existing.code != info.code => {
                debug!("Discarding mixed-unit expression {:?}", caps.get(0).map(|m| m.as_str()));
                return None;
            }
            _ => unit = Some(info),
        }
    }
    let unit = unit?;

    let kinds = [DimensionType::Length, DimensionType::Width, DimensionType::Height];
    slots
        .iter()
        .zip(kinds)
        .map(|((n, _), kind)| {
            numbers
                .parse(n.as_str())
                .map(|value| candidate(kind, value, unit, n.start(), expression))
        })
        .collect()
}

fn candidate(
    dimension_type: DimensionType,
    value: f64,
    unit: &UnitInfo,
    source_offset: usize,
    expression: usize,
) -> MeasurementCandidate {
    MeasurementCandidate {
        dimension_type,
        value,
        unit: unit.code.clone(),
        unit_system: unit.system,
        unit_kind: unit.kind,
        source_offset,
        expression,
    }
}

/// The expression must not be glued to surrounding letters or digits
/// (`M3x10`, `A4`, `2.5.1`).
fn standalone(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let glued_before = before.is_some_and(|c| c.is_alphanumeric() || c == '.' || c == ',');
    let glued_after = after.is_some_and(|c| c.is_alphanumeric());
    !glued_before && !glued_after
}

/// Pick one dimensions group and one weight from the candidates.
///
/// Dimensions: only groups with both length and width qualify. Metric beats
/// imperial beats unknown; then the group with more values; then the
/// earliest. Weight: metric first, then mass over volume, then earliest.
pub fn select_measurements(candidates: &[MeasurementCandidate]) -> MeasurementSelection {
    let mut selection = MeasurementSelection::default();

    let mut groups: BTreeMap<usize, Vec<&MeasurementCandidate>> = BTreeMap::new();
    for c in candidates.iter().filter(|c| c.dimension_type != DimensionType::Weight) {
        groups.entry(c.expression).or_default().push(c);
    }

    let find = |group: &[&MeasurementCandidate], kind: DimensionType| {
        group.iter().find(|c| c.dimension_type == kind).map(|c| c.value)
    };

    let mut eligible: Vec<(UnitSystem, usize, usize, SelectedDimensions)> = groups
        .values()
        .filter_map(|group| {
            let first = group.first()?;
            let length = find(&group[..], DimensionType::Length)?;
            let width = find(&group[..], DimensionType::Width)?;
            let height = find(&group[..], DimensionType::Height);
            let offset = group.iter().map(|c| c.source_offset).min()?;
            Some((
                first.unit_system,
                group.len(),
                offset,
                SelectedDimensions {
                    length,
                    width,
                    height,
                    unit: first.unit.clone(),
                    system: first.unit_system,
                },
            ))
        })
        .collect();
    eligible.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));

    if eligible.len() > 1 {
        let chosen = &eligible[0].3;
        if eligible.iter().any(|e| e.0 != chosen.system) {
            selection.notes.push(format!(
                "dimensions: {} expression preferred over other unit systems",
                system_name(chosen.system)
            ));
        }
        if eligible
            .iter()
            .skip(1)
            .any(|e| e.0 == chosen.system && e.3 != *chosen)
        {
            selection
                .notes
                .push("dimensions: several conflicting expressions, earliest kept".to_string());
        }
    }
    let unqualified = groups.len() - eligible.len();
    if unqualified > 0 {
        selection.notes.push(format!(
            "dimensions: {} expression(s) without length and width ignored",
            unqualified
        ));
    }
    selection.dimensions = eligible.into_iter().next().map(|e| e.3);

    let mut weights: Vec<&MeasurementCandidate> = candidates
        .iter()
        .filter(|c| c.dimension_type == DimensionType::Weight)
        .collect();
    weights.sort_by(|a, b| {
        a.unit_system
            .cmp(&b.unit_system)
            .then(kind_rank(a.unit_kind).cmp(&kind_rank(b.unit_kind)))
            .then(a.source_offset.cmp(&b.source_offset))
    });
    if let Some(chosen) = weights.first() {
        if weights.iter().any(|w| w.unit_system != chosen.unit_system) {
            selection.notes.push(format!(
                "weight: {} value preferred over other unit systems",
                system_name(chosen.unit_system)
            ));
        }
        if weights
            .iter()
            .skip(1)
            .any(|w| w.unit_system == chosen.unit_system && (w.value, &w.unit) != (chosen.value, &chosen.unit))
        {
            selection
                .notes
                .push("weight: several conflicting values, earliest kept".to_string());
        }
        selection.weight = Some(SelectedWeight {
            value: chosen.value,
            unit: chosen.unit.clone(),
            system: chosen.unit_system,
        });
    }

    selection
}

fn kind_rank(kind: UnitKind) -> u8 {
    match kind {
        UnitKind::Mass => 0,
        UnitKind::Volume => 1,
        UnitKind::Length => 2,
    }
}

fn system_name(system: UnitSystem) -> &'static str {
    match system {
        UnitSystem::Metric => "metric",
        UnitSystem::Imperial => "imperial",
        UnitSystem::Unknown => "unknown-system",
    }
}
