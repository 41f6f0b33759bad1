//! Catalog Core: product model, error taxonomy, configuration and vocabulary tables.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod vocabulary;

pub use config::{CategoryFallback, NumericLocale, PipelineConfig, TranslationConfig};
pub use diagnostics::{RecordDiagnostics, Rejection};
pub use error::{Error, Result, ValidationError, ValidationRule};
pub use model::{
    dedup_key, Dimensions, ProductDraft, ProductRecord, RawImage, RawProduct, RawVariant,
    SpecEntry, Variant, Weight,
};
pub use vocabulary::{CategoryNode, SubCategoryNode, UnitDefinition, UnitKind, UnitSystem, Vocabulary};
