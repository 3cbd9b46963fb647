//! AWS Textract OCR backend.
//!
//! Calls `DetectDocumentText` directly over HTTPS, signed with SigV4.
//! Credentials come from AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY
//! (and optional AWS_SESSION_TOKEN). Region from settings, then AWS_REGION,
//! then us-east-1.
//!
//! Set TEXTRACT_DELAY_MS to pace requests (default: 0ms).

use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::api_backend::{apply_rate_delay, create_client, ensure_success, retry_on_rate_limit};
use super::backend::{OcrBackend, OcrBackendType, OcrError, OcrResult, OcrSettings};
use super::model_utils::env_non_empty;
use super::sigv4::{sign_json_post, AwsCredentials};

const DEFAULT_REGION: &str = "us-east-1";
const SERVICE: &str = "textract";
const TARGET: &str = "Textract.DetectDocumentText";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Throttling error codes returned in the `__type` field.
const THROTTLING_ERRORS: &[&str] = &[
    "ThrottlingException",
    "ProvisionedThroughputExceededException",
];

/// AWS Textract backend.
pub struct TextractBackend {
    settings: OcrSettings,
    credentials: Option<AwsCredentials>,
    region: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectDocumentTextResponse {
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Block {
    block_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct AwsErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

impl TextractBackend {
    /// Create a new Textract backend with default settings.
    pub fn new() -> Self {
        Self::with_settings(OcrSettings::default())
    }

    /// Create a new Textract backend with custom settings.
    pub fn with_settings(settings: OcrSettings) -> Self {
        let credentials = match (
            env_non_empty("AWS_ACCESS_KEY_ID"),
            env_non_empty("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(AwsCredentials {
                access_key_id,
                secret_access_key,
                session_token: env_non_empty("AWS_SESSION_TOKEN"),
            }),
            _ => None,
        };
        let region = settings
            .aws_region
            .clone()
            .or_else(|| env_non_empty("AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self {
            settings,
            credentials,
            region,
        }
    }

    /// Set explicit credentials.
    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn host(&self) -> String {
        format!("textract.{}.amazonaws.com", self.region)
    }

    /// LINE blocks joined by newlines; confidence is the mean over WORD blocks.
    fn extract_text(response: DetectDocumentTextResponse) -> (String, Option<f32>) {
        let mut lines = Vec::new();
        let mut conf_sum = 0.0f64;
        let mut conf_count = 0usize;

        for block in response.blocks {
            match block.block_type.as_str() {
                "LINE" => {
                    if let Some(text) = block.text {
                        lines.push(text);
                    }
                }
                "WORD" => {
                    if let Some(conf) = block.confidence {
                        conf_sum += conf as f64;
                        conf_count += 1;
                    }
                }
                _ => {}
            }
        }

        let confidence = (conf_count > 0)
            .then(|| ((conf_sum / conf_count as f64) / 100.0).clamp(0.0, 1.0) as f32);
        (lines.join("\n"), confidence)
    }

    /// Map an AWS JSON error body to an `OcrError`.
    fn classify_error(status: u16, body: &str) -> OcrError {
        let parsed: Option<AwsErrorBody> = serde_json::from_str(body).ok();
        let (error_type, message) = parsed
            .map(|e| {
                // __type may be namespaced, e.g. "com.amazonaws...#ThrottlingException"
                let short = e
                    .error_type
                    .rsplit('#')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                (short, e.message)
            })
            .unwrap_or_else(|| (String::new(), body.to_string()));

        if THROTTLING_ERRORS.contains(&error_type.as_str()) {
            return OcrError::RateLimited {
                backend: OcrBackendType::Textract,
                retry_after_secs: None,
            };
        }
        OcrError::OcrFailed(format!(
            "Textract API error ({}): {} {}",
            status, error_type, message
        ))
    }

    async fn run_textract(&self, image: &[u8]) -> Result<(String, Option<f32>), OcrError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            OcrError::BackendNotAvailable(
                "AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY not set".to_string(),
            )
        })?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let body = &serde_json::to_vec(&json!({ "Document": { "Bytes": encoded } }))
            .map_err(|e| OcrError::OcrFailed(format!("Failed to encode request: {}", e)))?;
        let host = &self.host();
        let url = &format!("https://{}/", host);
        let region = self.region.as_str();
        let client = &create_client(self.settings.request_timeout_secs)?;

        apply_rate_delay("TEXTRACT_DELAY_MS", 0, "Textract").await;
        debug!("Textract: {} byte request to {}", body.len(), host);

        let response = retry_on_rate_limit(OcrBackendType::Textract, || async move {
            // Each attempt is signed fresh so x-amz-date stays current.
            let signed = sign_json_post(
                credentials,
                region,
                SERVICE,
                host,
                TARGET,
                CONTENT_TYPE,
                body,
                chrono::Utc::now(),
            )?;
            let mut request = client
                .post(url)
                .header("content-type", CONTENT_TYPE)
                .header("x-amz-target", TARGET)
                .header("x-amz-date", signed.amz_date)
                .header("authorization", signed.authorization)
                .body(body.clone());
            if let Some(token) = signed.security_token {
                request = request.header("x-amz-security-token", token);
            }
            request.send().await.map_err(OcrError::from)
        })
        .await?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_error(status.as_u16(), &body));
        }

        let response = ensure_success("Textract", response).await?;
        let parsed: DetectDocumentTextResponse = response
            .json()
            .await
            .map_err(|e| OcrError::OcrFailed(format!("Failed to parse response: {}", e)))?;

        Ok(Self::extract_text(parsed))
    }
}

impl Default for TextractBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrBackend for TextractBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Textract
    }

    fn is_available(&self) -> bool {
        self.credentials.is_some()
    }

    fn availability_hint(&self) -> String {
        if self.credentials.is_none() {
            "AWS credentials not set. Export AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY"
                .to_string()
        } else {
            format!("Textract is available (region: {})", self.region)
        }
    }

    async fn ocr_image(&self, image: &[u8]) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (text, confidence) = self.run_textract(image).await?;
        let elapsed = start.elapsed();

        Ok(OcrResult {
            text,
            confidence,
            backend: OcrBackendType::Textract,
            model: None,
            processing_time_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_lines_and_word_confidence() {
        let response: DetectDocumentTextResponse = serde_json::from_str(
            r#"{"DocumentMetadata":{"Pages":1},"Blocks":[
                {"BlockType":"PAGE","Confidence":99.9},
                {"BlockType":"LINE","Text":"ACME Corp","Confidence":99.0},
                {"BlockType":"WORD","Text":"ACME","Confidence":98.0},
                {"BlockType":"WORD","Text":"Corp","Confidence":94.0},
                {"BlockType":"LINE","Text":"Total 12.00","Confidence":90.0},
                {"BlockType":"WORD","Text":"Total","Confidence":92.0},
                {"BlockType":"WORD","Text":"12.00","Confidence":88.0}
            ]}"#,
        )
        .unwrap();

        let (text, confidence) = TextractBackend::extract_text(response);
        assert_eq!(text, "ACME Corp\nTotal 12.00");
        assert!((confidence.unwrap() - 0.93).abs() < 1e-5);
    }

    #[test]
    fn test_extract_empty_document() {
        let response: DetectDocumentTextResponse = serde_json::from_str(r#"{"Blocks":[]}"#).unwrap();
        let (text, confidence) = TextractBackend::extract_text(response);
        assert!(text.is_empty());
        assert!(confidence.is_none());
    }

    #[test]
    fn test_throttling_maps_to_rate_limited() {
        let err = TextractBackend::classify_error(
            400,
            r#"{"__type":"com.amazonaws.textract#ThrottlingException","message":"Rate exceeded"}"#,
        );
        assert!(matches!(
            err,
            OcrError::RateLimited {
                backend: OcrBackendType::Textract,
                ..
            }
        ));
    }

    #[test]
    fn test_other_errors_keep_message() {
        let err = TextractBackend::classify_error(
            400,
            r#"{"__type":"InvalidParameterException","Message":"Request has invalid parameters"}"#,
        );
        let msg = err.to_string();
        assert!(msg.contains("InvalidParameterException"));
        assert!(msg.contains("invalid parameters"));

        let err = TextractBackend::classify_error(403, "not json");
        assert!(err.to_string().contains("not json"));
    }

    #[test]
    fn test_region_from_settings() {
        let settings = OcrSettings {
            aws_region: Some("eu-central-1".to_string()),
            ..OcrSettings::default()
        };
        let backend = TextractBackend::with_settings(settings).with_credentials(AwsCredentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        });
        assert_eq!(backend.host(), "textract.eu-central-1.amazonaws.com");
        assert!(backend.is_available());
        assert!(backend.availability_hint().contains("eu-central-1"));
    }
}
