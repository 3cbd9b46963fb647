//! Brightness, contrast and blur metrics for a decoded image.

use serde::{Deserialize, Serialize};

use super::blur::{intensity_mean_variance, BlurEstimator};
use super::raster::RasterImage;

/// Normalized quality metrics derived from a single raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// Mean intensity / 255.
    pub brightness: f32,
    /// Population standard deviation of intensity / 255.
    pub contrast: f32,
    /// Score from the estimator used to compute these metrics.
    pub blur_score: f32,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// Compute brightness, contrast and blur score for an image.
///
/// All scores are clamped to [0, 1].
pub fn compute_quality_metrics(image: &RasterImage, estimator: &dyn BlurEstimator) -> QualityMetrics {
    let (mean, variance) = intensity_mean_variance(image.gray());

    let brightness = (mean / 255.0).clamp(0.0, 1.0) as f32;
    let contrast = (variance.sqrt() / 255.0).clamp(0.0, 1.0) as f32;
    let blur_score = estimator.estimate(image.gray());

    tracing::debug!(
        "Quality metrics ({}): brightness={:.3} contrast={:.3} blur={:.3}",
        estimator.name(),
        brightness,
        contrast,
        blur_score
    );

    QualityMetrics {
        brightness,
        contrast,
        blur_score,
        width: image.width(),
        height: image.height(),
        format: image.format().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::blur::{GlobalVarianceEstimator, LaplacianEstimator};
    use image::{GrayImage, Luma};

    #[test]
    fn test_uniform_gray() {
        let raster = RasterImage::from_gray(GrayImage::from_pixel(10, 10, Luma([51])), "png");
        let metrics = compute_quality_metrics(&raster, &LaplacianEstimator);

        assert!((metrics.brightness - 0.2).abs() < 1e-6);
        assert_eq!(metrics.contrast, 0.0);
        assert_eq!(metrics.blur_score, 1.0);
        assert_eq!(metrics.width, 10);
        assert_eq!(metrics.height, 10);
        assert_eq!(metrics.format, "png");
    }

    #[test]
    fn test_black_and_white_halves() {
        let gray = GrayImage::from_fn(20, 20, |_, y| if y < 10 { Luma([0]) } else { Luma([255]) });
        let raster = RasterImage::from_gray(gray, "png");
        let metrics = compute_quality_metrics(&raster, &GlobalVarianceEstimator);

        assert!((metrics.brightness - 0.5).abs() < 1e-6);
        assert!((metrics.contrast - 0.5).abs() < 1e-6);
        assert!((metrics.blur_score - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_all_white_and_all_black_bounds() {
        let white = RasterImage::from_gray(GrayImage::from_pixel(5, 5, Luma([255])), "png");
        let black = RasterImage::from_gray(GrayImage::from_pixel(5, 5, Luma([0])), "png");

        assert_eq!(compute_quality_metrics(&white, &GlobalVarianceEstimator).brightness, 1.0);
        assert_eq!(compute_quality_metrics(&black, &GlobalVarianceEstimator).brightness, 0.0);
    }

    #[test]
    fn test_serializes_camel_case() {
        let raster = RasterImage::from_gray(GrayImage::from_pixel(4, 4, Luma([0])), "jpeg");
        let json = serde_json::to_value(compute_quality_metrics(&raster, &LaplacianEstimator)).unwrap();
        assert!(json.get("blurScore").is_some());
        assert_eq!(json["format"], "jpeg");
    }
}
