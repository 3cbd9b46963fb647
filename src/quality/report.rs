//! Output shapes returned to callers of the scoring paths.

use serde::{Deserialize, Serialize};

use super::error::QualityError;
use super::metrics::QualityMetrics;

/// Recommendation when the quality check flags blur.
pub const BLURRY_RECOMMENDATION: &str =
    "Image appears blurry. Please retake the photo with better focus and lighting.";

/// Recommendation when the quality check passes.
pub const ACCEPTABLE_RECOMMENDATION: &str = "Image quality is acceptable for text extraction.";

/// Image statistics reported by the quality-only path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityInfo {
    pub brightness: f32,
    pub contrast: f32,
    pub width: u32,
    pub height: u32,
    pub format: String,
    /// Encoded input size in bytes.
    pub size: usize,
}

/// Result of the quality-only ("blur check") path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlurCheckReport {
    pub is_blurry: bool,
    pub blur_score: f32,
    pub quality: QualityInfo,
    pub threshold: f32,
    pub recommendation: String,
}

impl BlurCheckReport {
    pub fn new(metrics: &QualityMetrics, byte_size: usize, is_blurry: bool, threshold: f32) -> Self {
        let recommendation = if is_blurry {
            BLURRY_RECOMMENDATION
        } else {
            ACCEPTABLE_RECOMMENDATION
        };

        Self {
            is_blurry,
            blur_score: metrics.blur_score,
            quality: QualityInfo {
                brightness: metrics.brightness,
                contrast: metrics.contrast,
                width: metrics.width,
                height: metrics.height,
                format: metrics.format.clone(),
                size: byte_size,
            },
            threshold,
            recommendation: recommendation.to_string(),
        }
    }
}

/// Image dimensions and format echoed in the readability details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityDetails {
    pub word_count: usize,
    pub confidence_score: f32,
    pub image_quality: QualityMetrics,
    pub metadata: ImageMetadata,
}

/// Result of the readability path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityReport {
    pub is_readable: bool,
    pub readability_score: f32,
    pub details: ReadabilityDetails,
    pub text: String,
    pub suggestions: Vec<String>,
}

/// Failure shape: a descriptive message paired with a failure flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            kind: None,
        }
    }
}

impl From<&QualityError> for ErrorReport {
    fn from(err: &QualityError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            kind: Some(err.kind().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> QualityMetrics {
        QualityMetrics {
            brightness: 0.5,
            contrast: 0.2,
            blur_score: 0.1,
            width: 640,
            height: 480,
            format: "jpeg".to_string(),
        }
    }

    #[test]
    fn test_blur_check_json_shape() {
        let report = BlurCheckReport::new(&metrics(), 12345, true, 0.15);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["isBlurry"], true);
        assert_eq!(json["quality"]["size"], 12345);
        assert_eq!(json["quality"]["format"], "jpeg");
        assert_eq!(json["recommendation"], BLURRY_RECOMMENDATION);
        assert!(json["quality"].get("blurScore").is_none());
    }

    #[test]
    fn test_acceptable_recommendation() {
        let report = BlurCheckReport::new(&metrics(), 1, false, 0.15);
        assert_eq!(report.recommendation, ACCEPTABLE_RECOMMENDATION);
    }

    #[test]
    fn test_error_report() {
        let err = QualityError::Decode("bad header".to_string());
        let json = serde_json::to_value(ErrorReport::from(&err)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "decode");
        assert!(json["error"].as_str().unwrap().contains("bad header"));

        let json = serde_json::to_value(ErrorReport::new("boom")).unwrap();
        assert!(json.get("kind").is_none());
    }
}
