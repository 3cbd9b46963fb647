//! Text recognition backends.
//!
//! Every backend implements [`OcrBackend`] and takes encoded image bytes:
//!
//! - **Tesseract**: local engine via the `tesseract` binary, reports word confidence (default)
//! - **OCR.space**: hosted OCR API (`OCR_SPACE_API_KEY`)
//! - **Gemini**: LLM vision API (`GEMINI_API_KEY`)
//! - **Textract**: AWS `DetectDocumentText` (`AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`)
//!
//! Use `OcrManager` to pick a backend per call, or `FallbackOcrBackend`
//! to chain several.

mod api_backend;
mod backend;
mod fallback;
mod gemini;
mod model_utils;
mod ocr_space;
mod sigv4;
mod tesseract;
mod textract;

use std::sync::Arc;

pub use backend::{OcrBackend, OcrBackendType, OcrError, OcrManager, OcrResult, OcrSettings};
pub use fallback::FallbackOcrBackend;
pub use gemini::GeminiBackend;
pub use ocr_space::OcrSpaceBackend;
pub use sigv4::AwsCredentials;
pub use tesseract::{parse_tsv, TesseractBackend, TsvText};
pub use textract::TextractBackend;

/// Construct a backend of the given type from shared settings.
pub fn create_backend(backend_type: OcrBackendType, settings: &OcrSettings) -> Arc<dyn OcrBackend> {
    let settings = settings.clone();
    match backend_type {
        OcrBackendType::Tesseract => Arc::new(TesseractBackend::with_settings(settings)),
        OcrBackendType::OcrSpace => Arc::new(OcrSpaceBackend::with_settings(settings)),
        OcrBackendType::Gemini => Arc::new(GeminiBackend::with_settings(settings)),
        OcrBackendType::Textract => Arc::new(TextractBackend::with_settings(settings)),
    }
}

/// Resolve a backend spec: a single name, or a comma-separated fallback chain.
pub fn backend_from_spec(spec: &str, settings: &OcrSettings) -> Result<Arc<dyn OcrBackend>, OcrError> {
    let names: Vec<&str> = spec
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match names.as_slice() {
        [single] => {
            let backend_type = OcrBackendType::from_str(single).ok_or_else(|| {
                OcrError::BackendNotAvailable(format!("Unknown OCR backend: {}", single))
            })?;
            Ok(create_backend(backend_type, settings))
        }
        _ => Ok(Arc::new(FallbackOcrBackend::from_names(&names, settings)?)),
    }
}
