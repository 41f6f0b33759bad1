//! Error types for the catalog pipeline.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A structurally required raw field is missing or cannot be coerced.
    #[error("Malformed input: {field}: {reason}")]
    MalformedInput { field: String, reason: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Schema rule a draft record can violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    Required,
    Negative,
    NotFinite,
    IncompleteGroup,
    Duplicate,
    GalleryContainsMain,
    GalleryWithoutMain,
}

impl std::fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "required value is missing or empty"),
            Self::Negative => write!(f, "value must not be negative"),
            Self::NotFinite => write!(f, "value must be a finite number"),
            Self::IncompleteGroup => write!(f, "value group is partially populated"),
            Self::Duplicate => write!(f, "duplicate entry"),
            Self::GalleryContainsMain => write!(f, "gallery repeats the main image"),
            Self::GalleryWithoutMain => write!(f, "gallery present without a main image"),
        }
    }
}

/// First invariant violation found in a draft record.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{field}: {rule}")]
pub struct ValidationError {
    pub field: String,
    pub rule: ValidationRule,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, rule: ValidationRule) -> Self {
        Self {
            field: field.into(),
            rule,
        }
    }
}
