//! Per-record diagnostics report.

use serde::Serialize;

use crate::error::{Error, ValidationError};

/// Why a record was excluded from the output collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    MalformedInput { field: String, reason: String },
    Validation(ValidationError),
    /// Any other per-record failure.
    Failed { message: String },
}

impl From<&Error> for Rejection {
    fn from(err: &Error) -> Self {
        match err {
            Error::MalformedInput { field, reason } => Self::MalformedInput {
                field: field.clone(),
                reason: reason.clone(),
            },
            Error::Validation(v) => Self::Validation(v.clone()),
            other => Self::Failed {
                message: other.to_string(),
            },
        }
    }
}

/// Structured report of what happened to one input record.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDiagnostics {
    /// Position of the record in the input collection.
    pub index: usize,
    pub product_id: Option<String>,
    /// SHA-256 of the raw record JSON.
    pub source_hash: String,
    /// Optional attributes that were not found.
    pub missing_attributes: Vec<String>,
    /// Tie-breaks and other deterministic resolutions.
    pub notes: Vec<String>,
    /// Field paths left untranslated after retries.
    pub translation_failures: Vec<String>,
    /// Last call error when no translation attempt got a response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_unreachable: Option<String>,
    pub unrecognized_status: Option<String>,
    /// Category came from the fallback and needs a human decision.
    pub category_review: bool,
    pub rejection: Option<Rejection>,
}

impl RecordDiagnostics {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn missing(&mut self, attribute: &str) {
        if !self.missing_attributes.iter().any(|a| a == attribute) {
            self.missing_attributes.push(attribute.to_string());
        }
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn translation_failed(&mut self, field_path: &str) {
        self.translation_failures.push(field_path.to_string());
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}
