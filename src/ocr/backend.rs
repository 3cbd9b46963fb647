//! OCR backend abstraction for routing one image through interchangeable engines.
//!
//! Supports multiple OCR backends:
//! - Tesseract: local OCR engine via command-line (CPU)
//! - OCR.space: hosted OCR API
//! - Gemini: LLM vision API
//! - Textract: AWS Textract DetectDocumentText

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Rate limited by {backend}, retry after {retry_after_secs:?}s")]
    RateLimited {
        backend: OcrBackendType,
        retry_after_secs: Option<u64>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of OCR processing.
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    /// Extracted text content.
    pub text: String,
    /// Confidence score (0.0 - 1.0), if the engine reports one.
    pub confidence: Option<f32>,
    /// Which backend produced this result.
    pub backend: OcrBackendType,
    /// Which model was used (e.g., "gemini-1.5-flash").
    pub model: Option<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl OcrResult {
    /// Confidence on the 0-100 scale used by readability scoring.
    ///
    /// Engines that report no confidence count as 0.
    pub fn confidence_percent(&self) -> f32 {
        self.confidence
            .map(|c| (c * 100.0).clamp(0.0, 100.0))
            .unwrap_or(0.0)
    }
}

/// Available OCR backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendType {
    /// Tesseract OCR via command-line.
    Tesseract,
    /// OCR.space hosted API.
    OcrSpace,
    /// Google Gemini Vision API.
    Gemini,
    /// AWS Textract.
    Textract,
}

impl OcrBackendType {
    pub const ALL: [OcrBackendType; 4] = [
        OcrBackendType::Tesseract,
        OcrBackendType::OcrSpace,
        OcrBackendType::Gemini,
        OcrBackendType::Textract,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OcrBackendType::Tesseract => "tesseract",
            OcrBackendType::OcrSpace => "ocrspace",
            OcrBackendType::Gemini => "gemini",
            OcrBackendType::Textract => "textract",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" => Some(OcrBackendType::Tesseract),
            "ocrspace" | "ocr.space" | "ocr-space" => Some(OcrBackendType::OcrSpace),
            "gemini" | "llm" => Some(OcrBackendType::Gemini),
            "textract" | "aws" => Some(OcrBackendType::Textract),
            _ => None,
        }
    }
}

impl std::fmt::Display for OcrBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for OCR backends.
///
/// Backends are stateless request/response clients; concurrent calls are
/// independent.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> OcrBackendType;

    /// Check if this backend is available (binaries installed, credentials present).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Label for logs and comparison output.
    fn name(&self) -> String {
        self.backend_type().as_str().to_string()
    }

    /// Run OCR on encoded image bytes.
    async fn ocr_image(&self, image: &[u8]) -> Result<OcrResult, OcrError>;
}

/// Settings shared by all OCR backends.
#[derive(Debug, Clone)]
pub struct OcrSettings {
    /// Language for OCR (e.g., "eng", "chi_sim").
    pub language: String,
    /// Per-request timeout for hosted APIs, in seconds.
    pub request_timeout_secs: u64,
    /// Gemini model override.
    pub gemini_model: Option<String>,
    /// AWS region override for Textract.
    pub aws_region: Option<String>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            request_timeout_secs: 120,
            gemini_model: None,
            aws_region: None,
        }
    }
}

/// Manager for multiple OCR backends, enabling per-call backend selection.
pub struct OcrManager {
    backends: Vec<Arc<dyn OcrBackend>>,
    primary: OcrBackendType,
}

impl OcrManager {
    /// Create a new OCR manager with the specified primary backend.
    pub fn new(primary: OcrBackendType) -> Self {
        Self {
            backends: Vec::new(),
            primary,
        }
    }

    /// Create a manager with every known backend registered.
    pub fn with_all_backends(primary: OcrBackendType, settings: &OcrSettings) -> Self {
        let mut manager = Self::new(primary);
        for backend_type in OcrBackendType::ALL {
            manager.register(super::create_backend(backend_type, settings));
        }
        manager
    }

    /// Register a backend.
    pub fn register(&mut self, backend: Arc<dyn OcrBackend>) {
        self.backends.push(backend);
    }

    /// Get the primary backend.
    pub fn primary(&self) -> Option<Arc<dyn OcrBackend>> {
        self.get(self.primary)
    }

    /// Get a specific backend by type.
    pub fn get(&self, backend_type: OcrBackendType) -> Option<Arc<dyn OcrBackend>> {
        self.backends
            .iter()
            .find(|b| b.backend_type() == backend_type)
            .cloned()
    }

    /// List all registered backends.
    pub fn backends(&self) -> impl Iterator<Item = &Arc<dyn OcrBackend>> {
        self.backends.iter()
    }

    /// List available backends (those that can actually run).
    pub fn available_backends(&self) -> impl Iterator<Item = &Arc<dyn OcrBackend>> {
        self.backends.iter().filter(|b| b.is_available())
    }

    /// Get a specific backend, validated and ready to use.
    fn get_ready_backend(&self, backend_type: OcrBackendType) -> Result<Arc<dyn OcrBackend>, OcrError> {
        let backend = self.get(backend_type).ok_or_else(|| {
            OcrError::BackendNotAvailable(format!("Backend {} not registered", backend_type))
        })?;
        if !backend.is_available() {
            return Err(OcrError::BackendNotAvailable(backend.availability_hint()));
        }
        Ok(backend)
    }

    /// Run OCR using the primary backend.
    pub async fn ocr_image(&self, image: &[u8]) -> Result<OcrResult, OcrError> {
        self.get_ready_backend(self.primary)?.ocr_image(image).await
    }

    /// Run OCR using a specific backend.
    pub async fn ocr_image_with(
        &self,
        image: &[u8],
        backend_type: OcrBackendType,
    ) -> Result<OcrResult, OcrError> {
        self.get_ready_backend(backend_type)?.ocr_image(image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedBackend {
        kind: OcrBackendType,
        available: bool,
    }

    #[async_trait]
    impl OcrBackend for FixedBackend {
        fn backend_type(&self) -> OcrBackendType {
            self.kind
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn availability_hint(&self) -> String {
            format!("{} is switched off", self.kind)
        }

        async fn ocr_image(&self, image: &[u8]) -> Result<OcrResult, OcrError> {
            Ok(OcrResult {
                text: format!("{} bytes", image.len()),
                confidence: Some(0.5),
                backend: self.kind,
                model: None,
                processing_time_ms: 0,
            })
        }
    }

    #[test]
    fn test_backend_type_round_trip_names() {
        for kind in OcrBackendType::ALL {
            assert_eq!(OcrBackendType::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(OcrBackendType::from_str("OCR.Space"), Some(OcrBackendType::OcrSpace));
        assert_eq!(OcrBackendType::from_str("deepseek"), None);
    }

    #[test]
    fn test_confidence_percent() {
        let mut result = OcrResult {
            text: String::new(),
            confidence: Some(0.873),
            backend: OcrBackendType::Tesseract,
            model: None,
            processing_time_ms: 1,
        };
        assert!((result.confidence_percent() - 87.3).abs() < 1e-3);
        result.confidence = None;
        assert_eq!(result.confidence_percent(), 0.0);
    }

    #[tokio::test]
    async fn test_manager_routes_to_requested_backend() {
        let mut manager = OcrManager::new(OcrBackendType::Tesseract);
        manager.register(Arc::new(FixedBackend {
            kind: OcrBackendType::Tesseract,
            available: true,
        }));
        manager.register(Arc::new(FixedBackend {
            kind: OcrBackendType::Gemini,
            available: false,
        }));

        let result = manager.ocr_image(b"abc").await.unwrap();
        assert_eq!(result.backend, OcrBackendType::Tesseract);
        assert_eq!(result.text, "3 bytes");

        let err = manager
            .ocr_image_with(b"abc", OcrBackendType::Gemini)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("switched off"));

        let err = manager
            .ocr_image_with(b"abc", OcrBackendType::Textract)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::BackendNotAvailable(_)));

        assert_eq!(manager.available_backends().count(), 1);
        assert_eq!(manager.backends().count(), 2);
    }
}
