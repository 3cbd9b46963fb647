//! Errors raised while scoring a document image.

use thiserror::Error;

use crate::ocr::OcrError;

/// Failures that abort a scoring request.
///
/// None of these are retried; the caller gets the message and a failure flag.
#[derive(Debug, Error)]
pub enum QualityError {
    /// The input bytes are not a decodable raster image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The image is smaller than the configured minimum document size.
    #[error(
        "Image resolution too low: {width}x{height} (minimum required: {min_width}x{min_height})"
    )]
    ResolutionTooLow {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },

    /// The text-recognition collaborator failed.
    #[error("Text recognition failed: {0}")]
    RecognitionService(#[from] OcrError),

    /// A blocking analysis task panicked or was cancelled.
    #[error("Image analysis task failed: {0}")]
    Worker(String),
}

impl QualityError {
    /// Short machine-readable tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            QualityError::Decode(_) => "decode",
            QualityError::ResolutionTooLow { .. } => "resolution_too_low",
            QualityError::RecognitionService(_) => "recognition_service",
            QualityError::Worker(_) => "worker",
        }
    }
}

impl From<image::ImageError> for QualityError {
    fn from(err: image::ImageError) -> Self {
        QualityError::Decode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for QualityError {
    fn from(err: tokio::task::JoinError) -> Self {
        QualityError::Worker(err.to_string())
    }
}
