//! OCR.space hosted OCR backend.
//!
//! Requires OCR_SPACE_API_KEY environment variable.
//! Set OCR_SPACE_DELAY_MS to pace requests (default: 0ms).

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use super::api_backend::{
    apply_rate_delay, create_client, encode_image_base64, ensure_success, retry_on_rate_limit,
};
use super::backend::{OcrBackend, OcrBackendType, OcrError, OcrResult, OcrSettings};
use super::model_utils::env_non_empty;

const ENDPOINT: &str = "https://api.ocr.space/parse/image";

/// OCR engine 2 handles photographed documents better than engine 1.
const OCR_ENGINE: &str = "2";

/// OCR.space backend.
pub struct OcrSpaceBackend {
    settings: OcrSettings,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    parsed_results: Vec<OcrSpaceParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceParsedResult {
    #[serde(default)]
    parsed_text: String,
}

impl OcrSpaceBackend {
    /// Create a new OCR.space backend with default settings.
    pub fn new() -> Self {
        Self::with_settings(OcrSettings::default())
    }

    /// Create a new OCR.space backend with custom settings.
    pub fn with_settings(settings: OcrSettings) -> Self {
        Self {
            settings,
            api_key: env_non_empty("OCR_SPACE_API_KEY"),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Flatten the error message field, which the API sends as a string or a list.
    fn error_text(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "unknown error".to_string(),
        }
    }

    fn extract_text(response: OcrSpaceResponse) -> Result<String, OcrError> {
        if response.is_errored_on_processing {
            return Err(OcrError::OcrFailed(format!(
                "OCR.space error: {}",
                Self::error_text(&response.error_message)
            )));
        }

        Ok(response
            .parsed_results
            .into_iter()
            .map(|r| r.parsed_text)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn run_ocr_space(&self, image: &[u8]) -> Result<String, OcrError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            OcrError::BackendNotAvailable(
                "OCR_SPACE_API_KEY not set. Get a free key from https://ocr.space/ocrapi"
                    .to_string(),
            )
        })?;

        let (data, mime_type) = encode_image_base64(image);
        let data_uri = format!("data:{};base64,{}", mime_type, data);
        let form = &[
            ("apikey", api_key.as_str()),
            ("base64Image", data_uri.as_str()),
            ("language", ocr_space_language(&self.settings.language)),
            ("OCREngine", OCR_ENGINE),
            ("scale", "true"),
            ("isOverlayRequired", "false"),
        ];
        let client = &create_client(self.settings.request_timeout_secs)?;

        apply_rate_delay("OCR_SPACE_DELAY_MS", 0, "OCR.space").await;

        let response = retry_on_rate_limit(OcrBackendType::OcrSpace, || async move {
            client
                .post(ENDPOINT)
                .form(form)
                .send()
                .await
                .map_err(OcrError::from)
        })
        .await?;

        let response = ensure_success("OCR.space", response).await?;
        let parsed: OcrSpaceResponse = response
            .json()
            .await
            .map_err(|e| OcrError::OcrFailed(format!("Failed to parse response: {}", e)))?;

        Self::extract_text(parsed)
    }
}

/// OCR.space uses its own three-letter codes; most match Tesseract's.
fn ocr_space_language(language: &str) -> &str {
    match language {
        "chi_sim" => "chs",
        "chi_tra" => "cht",
        "deu" => "ger",
        "fra" => "fre",
        other => other,
    }
}

impl Default for OcrSpaceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrBackend for OcrSpaceBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::OcrSpace
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn availability_hint(&self) -> String {
        if self.api_key.is_none() {
            "OCR_SPACE_API_KEY not set. Get a free key from https://ocr.space/ocrapi".to_string()
        } else {
            "OCR.space is available".to_string()
        }
    }

    async fn ocr_image(&self, image: &[u8]) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let text = self.run_ocr_space(image).await?;
        let elapsed = start.elapsed();

        Ok(OcrResult {
            text,
            confidence: None,
            backend: OcrBackendType::OcrSpace,
            model: Some(format!("engine-{}", OCR_ENGINE)),
            processing_time_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text() {
        let response: OcrSpaceResponse = serde_json::from_str(
            r#"{"ParsedResults":[{"ParsedText":"Hello\r\nWorld","FileParseExitCode":1}],
                "OCRExitCode":1,"IsErroredOnProcessing":false}"#,
        )
        .unwrap();
        assert_eq!(
            OcrSpaceBackend::extract_text(response).unwrap(),
            "Hello\r\nWorld"
        );
    }

    #[test]
    fn test_error_as_list() {
        let response: OcrSpaceResponse = serde_json::from_str(
            r#"{"OCRExitCode":3,"IsErroredOnProcessing":true,
                "ErrorMessage":["Unable to recognize the file type","E216"]}"#,
        )
        .unwrap();
        let err = OcrSpaceBackend::extract_text(response).unwrap_err();
        assert!(err
            .to_string()
            .contains("Unable to recognize the file type; E216"));
    }

    #[test]
    fn test_error_as_string() {
        let response: OcrSpaceResponse = serde_json::from_str(
            r#"{"IsErroredOnProcessing":true,"ErrorMessage":"Timed out waiting for results"}"#,
        )
        .unwrap();
        let err = OcrSpaceBackend::extract_text(response).unwrap_err();
        assert!(err.to_string().contains("Timed out"));
    }

    #[test]
    fn test_language_mapping() {
        assert_eq!(ocr_space_language("eng"), "eng");
        assert_eq!(ocr_space_language("deu"), "ger");
    }
}
