//! Translation request and response types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One piece of text to translate, addressed by its field path
/// (`title`, `keyFeatures[2]`, `technicalSpecifications[0].value`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextUnit {
    pub field_path: String,
    pub source_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language_hint: Option<String>,
}

/// Outcome for one [`TextUnit`]: a translation or a per-field error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub field_path: String,
    #[serde(default)]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TranslationResult {
    pub fn translated(field_path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            translated_text: Some(text.into()),
            error: None,
        }
    }

    pub fn failed(field_path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            translated_text: None,
            error: Some(error.into()),
        }
    }
}

/// Call-level failure of a translation backend.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
