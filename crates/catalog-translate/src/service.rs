//! Translation backends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use catalog_core::TranslationConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::{TextUnit, TranslateError, TranslationResult};

/// A text-transform service that translates batches of field-addressed text.
///
/// Implementations return one result per unit they handled; units missing from
/// the response are treated as failed for that attempt. Result order is not
/// significant.
#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate_batch(
        &self,
        units: &[TextUnit],
    ) -> Result<Vec<TranslationResult>, TranslateError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

/// Identity backend used when no translation endpoint is configured.
pub struct PassthroughTranslator;

#[async_trait]
impl TranslationService for PassthroughTranslator {
    async fn translate_batch(
        &self,
        units: &[TextUnit],
    ) -> Result<Vec<TranslationResult>, TranslateError> {
        Ok(units
            .iter()
            .map(|u| TranslationResult::translated(u.field_path.clone(), u.source_text.clone()))
            .collect())
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest<'a> {
    target_language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_language: Option<&'a str>,
    units: &'a [TextUnit],
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    results: Vec<TranslationResult>,
}

/// JSON-over-HTTP backend: `POST {endpoint}` with
/// `{targetLanguage, sourceLanguage?, units}`, answered by `{results}`.
pub struct HttpTranslator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    target_language: String,
    source_language: Option<String>,
}

impl HttpTranslator {
    pub fn new(config: &TranslationConfig, endpoint: &str) -> Result<Self, TranslateError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: config.api_key.clone(),
            target_language: config.target_language.clone(),
            source_language: config.source_language.clone(),
        })
    }
}

#[async_trait]
impl TranslationService for HttpTranslator {
    async fn translate_batch(
        &self,
        units: &[TextUnit],
    ) -> Result<Vec<TranslationResult>, TranslateError> {
        let body = TranslateRequest {
            target_language: &self.target_language,
            source_language: self.source_language.as_deref(),
            units,
        };

        debug!("Translating {} units via {}", units.len(), self.endpoint);

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Status { status, body });
        }

        let parsed: TranslateResponse = response.json().await?;
        Ok(parsed.results)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Build the configured backend.
///
/// Uses the HTTP backend when an endpoint is configured, falling back to
/// [`PassthroughTranslator`].
pub fn create_translator(config: &TranslationConfig) -> Arc<dyn TranslationService> {
    if let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        match HttpTranslator::new(config, endpoint) {
            Ok(translator) => {
                info!(
                    "Using HTTP translator at {} (target language {})",
                    endpoint, config.target_language
                );
                return Arc::new(translator);
            }
            Err(e) => {
                warn!("HTTP translator unavailable: {}. Falling back to passthrough.", e);
            }
        }
    } else {
        info!("No translation endpoint configured. Text is passed through unchanged.");
    }

    Arc::new(PassthroughTranslator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_is_identity() {
        let units = vec![TextUnit {
            field_path: "title".into(),
            source_text: "Lantern".into(),
            source_language_hint: Some("en".into()),
        }];
        let results = PassthroughTranslator.translate_batch(&units).await.unwrap();
        assert_eq!(results, vec![TranslationResult::translated("title", "Lantern")]);
    }

    #[test]
    fn test_create_translator_selects_backend() {
        let config = TranslationConfig::default();
        assert_eq!(create_translator(&config).name(), "passthrough");

        let config = TranslationConfig {
            endpoint: Some("http://127.0.0.1:9/translate".into()),
            ..Default::default()
        };
        assert_eq!(create_translator(&config).name(), "http");
    }

    #[test]
    fn test_request_shape() {
        let units = vec![TextUnit {
            field_path: "colors[0]".into(),
            source_text: "black".into(),
            source_language_hint: None,
        }];
        let body = TranslateRequest {
            target_language: "he",
            source_language: None,
            units: &units,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["targetLanguage"], "he");
        assert!(json.get("sourceLanguage").is_none());
        assert_eq!(json["units"][0]["sourceText"], "black");
    }

    #[tokio::test]
    async fn test_http_transport_error() {
        let config = TranslationConfig {
            timeout_ms: 500,
            ..Default::default()
        };
        let translator = HttpTranslator::new(&config, "http://127.0.0.1:9/translate").unwrap();
        let err = translator.translate_batch(&[]).await.unwrap_err();
        assert!(matches!(err, TranslateError::Transport(_)));
    }
}
