//! Google Gemini Vision OCR backend implementation.
//!
//! Uses Gemini's vision API for LLM-based text extraction.
//! Requires GEMINI_API_KEY environment variable.
//!
//! Rate limiting:
//! - Set GEMINI_DELAY_MS to configure delay between requests (default: 200ms)
//! - Automatically retries on 429 with exponential backoff
//! - Respects Retry-After header from API

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::api_backend::{
    apply_rate_delay, create_client, encode_image_base64, ensure_success, retry_on_rate_limit,
    VISION_OCR_PROMPT,
};
use super::backend::{OcrBackend, OcrBackendType, OcrError, OcrResult, OcrSettings};
use super::model_utils::env_non_empty;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini Vision OCR backend using Google's Generative AI API.
pub struct GeminiBackend {
    settings: OcrSettings,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend with default settings.
    pub fn new() -> Self {
        Self::with_settings(OcrSettings::default())
    }

    /// Create a new Gemini backend with custom settings.
    pub fn with_settings(settings: OcrSettings) -> Self {
        let model = settings
            .gemini_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            settings,
            api_key: env_non_empty("GEMINI_API_KEY"),
            model,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the model (e.g., "gemini-1.5-flash", "gemini-1.5-pro").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_request(image: &[u8]) -> GeminiRequest {
        let (data, mime_type) = encode_image_base64(image);
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::Text {
                        text: VISION_OCR_PROMPT.to_string(),
                    },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: mime_type.to_string(),
                            data,
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.1,
                max_output_tokens: 8192,
            },
        }
    }

    /// Pull the text out of a decoded response.
    fn extract_text(response: GeminiResponse) -> Result<String, OcrError> {
        if let Some(error) = response.error {
            return Err(OcrError::OcrFailed(format!(
                "Gemini API error: {}",
                error.message
            )));
        }

        Ok(response
            .candidates
            .and_then(|c| c.into_iter().next())
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }

    async fn run_gemini(&self, image: &[u8]) -> Result<String, OcrError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            OcrError::BackendNotAvailable(
                "GEMINI_API_KEY not set. Get an API key from https://ai.google.dev/".to_string(),
            )
        })?;

        let request = &Self::build_request(image);
        let url = &format!("{}/{}:generateContent", API_BASE, self.model);
        let client = &create_client(self.settings.request_timeout_secs)?;

        apply_rate_delay("GEMINI_DELAY_MS", 200, "Gemini").await;

        let response = retry_on_rate_limit(OcrBackendType::Gemini, || async move {
            client
                .post(url)
                .header("x-goog-api-key", api_key.as_str())
                .json(request)
                .send()
                .await
                .map_err(OcrError::from)
        })
        .await?;

        let response = ensure_success("Gemini", response).await?;
        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| OcrError::OcrFailed(format!("Failed to parse response: {}", e)))?;

        Self::extract_text(gemini_response)
    }
}

impl Default for GeminiBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrBackend for GeminiBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Gemini
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn availability_hint(&self) -> String {
        if self.api_key.is_none() {
            "GEMINI_API_KEY not set. Get an API key from https://ai.google.dev/".to_string()
        } else {
            format!("Gemini Vision is available (model: {})", self.model)
        }
    }

    async fn ocr_image(&self, image: &[u8]) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let text = self.run_gemini(image).await?;
        let elapsed = start.elapsed();

        Ok(OcrResult {
            text,
            confidence: None,
            backend: OcrBackendType::Gemini,
            model: Some(self.model.clone()),
            processing_time_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = GeminiBackend::build_request(&[0xFF, 0xD8, 0xFF, 0xE0]);
        let json = serde_json::to_value(&request).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], VISION_OCR_PROMPT);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert!(json["generationConfig"]["maxOutputTokens"].is_number());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"RECEIPT\n"},{"text":"Total 4.50"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(
            GeminiBackend::extract_text(response).unwrap(),
            "RECEIPT\nTotal 4.50"
        );
    }

    #[test]
    fn test_extract_text_surfaces_api_error() {
        let response: GeminiResponse =
            serde_json::from_str(r#"{"error":{"message":"API key not valid"}}"#).unwrap();
        let err = GeminiBackend::extract_text(response).unwrap_err();
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn test_availability_follows_key() {
        let backend = GeminiBackend::new().with_api_key("k").with_model("gemini-1.5-pro");
        assert!(backend.is_available());
        assert!(backend.availability_hint().contains("gemini-1.5-pro"));
    }
}
