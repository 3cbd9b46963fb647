//! Readability scoring: combines image metrics with a recognition outcome.

use serde::{Deserialize, Serialize};

use super::blur::{BlurEstimator, LaplacianEstimator};
use super::config::QualityConfig;
use super::error::QualityError;
use super::metrics::{compute_quality_metrics, QualityMetrics};
use super::raster::RasterImage;
use super::report::{ImageMetadata, ReadabilityDetails, ReadabilityReport};

/// Weight of OCR confidence in the readability score.
pub const CONFIDENCE_WEIGHT: f32 = 0.4;
/// Weight of sharpness (1 - blur) in the readability score.
pub const BLUR_WEIGHT: f32 = 0.3;
/// Weight of contrast in the readability score.
pub const CONTRAST_WEIGHT: f32 = 0.2;
/// Weight of word count in the readability score.
pub const WORD_COUNT_WEIGHT: f32 = 0.1;

/// Word count that earns full word-count credit.
pub const FULL_CREDIT_WORDS: f32 = 10.0;

/// Minimum readability score for an image to be considered readable.
pub const READABLE_SCORE: f32 = 70.0;

const POOR_SCORE: f32 = 50.0;
const MIN_CONTRAST: f32 = 0.4;
const MIN_BRIGHTNESS: f32 = 0.3;
const MAX_BRIGHTNESS: f32 = 0.8;

/// Weighted 0-100 readability score.
///
/// `confidence_score` is on a 0-100 scale; `blur_score` and `contrast` are
/// on 0-1. Weights are fixed at 0.4 / 0.3 / 0.2 / 0.1.
pub fn compute_readability_score(
    confidence_score: f32,
    blur_score: f32,
    contrast: f32,
    word_count: usize,
) -> f32 {
    let confidence = confidence_score.clamp(0.0, 100.0);
    let sharpness = (1.0 - blur_score.clamp(0.0, 1.0)) * 100.0;
    let contrast = contrast.clamp(0.0, 1.0) * 100.0;
    let words = (word_count as f32 / FULL_CREDIT_WORDS * 100.0).min(100.0);

    let score = confidence * CONFIDENCE_WEIGHT
        + sharpness * BLUR_WEIGHT
        + contrast * CONTRAST_WEIGHT
        + words * WORD_COUNT_WEIGHT;

    score.clamp(0.0, 100.0)
}

/// Rule-based improvement hints, in a fixed order.
///
/// An image that triggers no rule gets an empty list.
pub fn generate_suggestions(
    readability_score: f32,
    metrics: &QualityMetrics,
    confidence_score: f32,
    estimator: &dyn BlurEstimator,
    config: &QualityConfig,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if readability_score < POOR_SCORE {
        suggestions.push(
            "Image quality is poor. Consider retaking the photo in better conditions.".to_string(),
        );
    } else if readability_score < READABLE_SCORE {
        suggestions
            .push("Image quality could be improved for more reliable text recognition.".to_string());
    }

    if estimator.is_blurry(metrics.blur_score, config.blur_threshold) {
        suggestions.push(
            "Image appears blurry. Hold the camera steady and make sure the document is in focus."
                .to_string(),
        );
    }

    if metrics.contrast < MIN_CONTRAST {
        suggestions.push(
            "Low contrast detected. Improve lighting or use a background that contrasts with the document."
                .to_string(),
        );
    }

    if metrics.brightness < MIN_BRIGHTNESS {
        suggestions.push("Image is too dark. Add light or avoid shadows over the document.".to_string());
    } else if metrics.brightness > MAX_BRIGHTNESS {
        suggestions.push("Image is too bright. Reduce glare or direct light on the document.".to_string());
    }

    if confidence_score < config.min_confidence {
        suggestions.push(
            "Text recognition confidence is low. Make sure the text is clearly visible and unobstructed."
                .to_string(),
        );
    }

    suggestions
}

/// Count whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Terminal result of the readability path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityResult {
    pub is_readable: bool,
    pub readability_score: f32,
    pub word_count: usize,
    pub confidence_score: f32,
    pub quality_metrics: QualityMetrics,
    pub extracted_text: String,
    pub suggestions: Vec<String>,
}

impl ReadabilityResult {
    /// Convert to the boundary output shape.
    pub fn to_report(&self) -> ReadabilityReport {
        ReadabilityReport {
            is_readable: self.is_readable,
            readability_score: self.readability_score,
            details: ReadabilityDetails {
                word_count: self.word_count,
                confidence_score: self.confidence_score,
                image_quality: self.quality_metrics.clone(),
                metadata: ImageMetadata {
                    width: self.quality_metrics.width,
                    height: self.quality_metrics.height,
                    format: self.quality_metrics.format.clone(),
                },
            },
            text: self.extracted_text.clone(),
            suggestions: self.suggestions.clone(),
        }
    }
}

/// Scores decoded images for fitness for text extraction.
///
/// Always uses the Laplacian estimator, so blur scores here run from
/// 0 (sharp) to 1 (blurry).
#[derive(Debug, Clone, Default)]
pub struct ReadabilityAnalyzer {
    config: QualityConfig,
}

impl ReadabilityAnalyzer {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Decode the image and apply the minimum size policy.
    pub fn prepare(&self, bytes: &[u8]) -> Result<RasterImage, QualityError> {
        let image = RasterImage::decode(bytes)?;
        image.ensure_min_size(self.config.min_document_size)?;
        Ok(image)
    }

    /// Combine image metrics with recognized text and confidence (0-100).
    pub fn evaluate(&self, image: &RasterImage, text: &str, confidence_score: f32) -> ReadabilityResult {
        let estimator = LaplacianEstimator;
        let metrics = compute_quality_metrics(image, &estimator);
        let word_count = count_words(text);

        let readability_score =
            compute_readability_score(confidence_score, metrics.blur_score, metrics.contrast, word_count);

        let suggestions =
            generate_suggestions(readability_score, &metrics, confidence_score, &estimator, &self.config);

        let is_readable = readability_score >= READABLE_SCORE
            && confidence_score >= self.config.min_confidence
            && text.trim().chars().count() >= self.config.min_text_length;

        tracing::debug!(
            "Readability: score={:.1} words={} confidence={:.1} readable={}",
            readability_score,
            word_count,
            confidence_score,
            is_readable
        );

        ReadabilityResult {
            is_readable,
            readability_score,
            word_count,
            confidence_score,
            quality_metrics: metrics,
            extracted_text: text.to_string(),
            suggestions,
        }
    }
}
