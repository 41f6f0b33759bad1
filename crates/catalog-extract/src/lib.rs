//! Catalog Extract: text sanitizing, measurement parsing and attribute mining.

pub mod lexicon;
pub mod measure;
pub mod mine;
pub mod numeric;
pub mod sanitize;

pub use lexicon::{Lexicon, MineLimits, PhraseMatcher, UnitInfo};
pub use measure::{
    extract_measurements, extract_measurements_from, extract_measurements_with, select_measurements, DimensionType,
    MeasurementCandidate, MeasurementSelection, SelectedDimensions, SelectedWeight,
};
pub use mine::{mine, mine_with_hints, CategoryHint, MinedAttributes};
pub use numeric::{parser_for, AutoDetect, CommaDecimal, DotDecimal, NumericParser};
pub use sanitize::{sanitize, SanitizedText};
