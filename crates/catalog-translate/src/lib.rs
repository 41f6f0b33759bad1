//! Localization of product records through a pluggable text-transform service.
//!
//! The service is called in batches of field-addressed [`TextUnit`]s with a
//! per-call timeout and bounded exponential backoff. Backends: JSON over HTTP,
//! or passthrough when no endpoint is configured.

pub mod fields;
pub mod localize;
pub mod service;
pub mod types;

pub use fields::{translatable_fields, TextField};
pub use localize::{Localizer, RetryPolicy};
pub use service::{create_translator, HttpTranslator, PassthroughTranslator, TranslationService};
pub use types::{TextUnit, TranslateError, TranslationResult};
