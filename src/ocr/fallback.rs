//! Fallback chain: try a list of backends in order until one succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::backend::{OcrBackend, OcrBackendType, OcrError, OcrResult, OcrSettings};

/// A backend that delegates to the first working member of a chain.
///
/// Unavailable members are skipped; a failing member hands over to the next.
/// The last error is returned when the whole chain fails.
pub struct FallbackOcrBackend {
    chain: Vec<Arc<dyn OcrBackend>>,
}

impl FallbackOcrBackend {
    /// Build a chain from already-constructed backends.
    pub fn new(chain: Vec<Arc<dyn OcrBackend>>) -> Self {
        Self { chain }
    }

    /// Build a chain from backend names such as `["gemini", "tesseract"]`.
    pub fn from_names<S: AsRef<str>>(names: &[S], settings: &OcrSettings) -> Result<Self, OcrError> {
        let mut chain = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let backend_type = OcrBackendType::from_str(name).ok_or_else(|| {
                OcrError::BackendNotAvailable(format!("Unknown OCR backend: {}", name))
            })?;
            chain.push(super::create_backend(backend_type, settings));
        }
        if chain.is_empty() {
            return Err(OcrError::BackendNotAvailable(
                "Fallback chain has no backends".to_string(),
            ));
        }
        info!(
            "OCR fallback chain: {}",
            chain
                .iter()
                .map(|b| b.backend_type().as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(Self { chain })
    }

    /// Backends in the order they are tried.
    pub fn chain(&self) -> &[Arc<dyn OcrBackend>] {
        &self.chain
    }
}

#[async_trait]
impl OcrBackend for FallbackOcrBackend {
    /// Reports the first member's type.
    fn backend_type(&self) -> OcrBackendType {
        self.chain
            .first()
            .map(|b| b.backend_type())
            .unwrap_or(OcrBackendType::Tesseract)
    }

    /// The chain spec, e.g. `gemini,tesseract`.
    fn name(&self) -> String {
        self.chain
            .iter()
            .map(|b| b.name())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn is_available(&self) -> bool {
        self.chain.iter().any(|b| b.is_available())
    }

    fn availability_hint(&self) -> String {
        self.chain
            .iter()
            .map(|b| format!("{}: {}", b.backend_type(), b.availability_hint()))
            .collect::<Vec<_>>()
            .join("; ")
    }

    async fn ocr_image(&self, image: &[u8]) -> Result<OcrResult, OcrError> {
        let mut last_error = None;

        for backend in &self.chain {
            if !backend.is_available() {
                warn!(
                    "Skipping {}: {}",
                    backend.backend_type(),
                    backend.availability_hint()
                );
                last_error = Some(OcrError::BackendNotAvailable(backend.availability_hint()));
                continue;
            }

            match backend.ocr_image(image).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!("{} failed, trying next backend: {}", backend.backend_type(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            OcrError::BackendNotAvailable("Fallback chain has no backends".to_string())
        }))
    }
}
