//! Blur estimators.
//!
//! Two strategies with different semantics share one trait:
//!
//! - [`GlobalVarianceEstimator`]: intensity variance / 255². Higher means more
//!   tonal spread; an image scoring *below* the threshold is flagged blurry.
//!   This is not an edge measure: a flat, low-contrast but perfectly sharp
//!   scan scores the same as a blurred one.
//! - [`LaplacianEstimator`]: mean absolute 4-neighbour Laplacian over interior
//!   pixels, mapped to `1 - energy/255`. 0 is sharp, 1 is blurry; an image
//!   scoring *above* the threshold is flagged blurry.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Estimates how blurred a grayscale image is.
pub trait BlurEstimator: Send + Sync {
    /// Short strategy name.
    fn name(&self) -> &'static str;

    /// Compute the blur score, always within [0, 1].
    fn estimate(&self, image: &GrayImage) -> f32;

    /// Interpret a score from this estimator against a threshold.
    fn is_blurry(&self, score: f32, threshold: f32) -> bool;
}

/// Available blur estimation strategies.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BlurStrategy {
    /// Global intensity variance (used by the quality check)
    #[default]
    Variance,
    /// Laplacian edge energy (used by the readability check)
    Laplacian,
}

impl BlurStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlurStrategy::Variance => "variance",
            BlurStrategy::Laplacian => "laplacian",
        }
    }

    /// Get the estimator implementing this strategy.
    pub fn estimator(&self) -> &'static dyn BlurEstimator {
        match self {
            BlurStrategy::Variance => &GlobalVarianceEstimator,
            BlurStrategy::Laplacian => &LaplacianEstimator,
        }
    }
}

impl std::fmt::Display for BlurStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Blur proxy based on raw intensity variance.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalVarianceEstimator;

impl BlurEstimator for GlobalVarianceEstimator {
    fn name(&self) -> &'static str {
        "variance"
    }

    fn estimate(&self, image: &GrayImage) -> f32 {
        let (_, variance) = intensity_mean_variance(image);
        (variance / (255.0 * 255.0)).clamp(0.0, 1.0) as f32
    }

    fn is_blurry(&self, score: f32, threshold: f32) -> bool {
        score < threshold
    }
}

/// Edge-energy sharpness measure using the discrete Laplacian.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaplacianEstimator;

impl LaplacianEstimator {
    /// Mean of `|4c - l - r - t - b|` over all interior pixels.
    ///
    /// Images without interior pixels (either side < 3) have zero edge energy.
    pub fn edge_energy(image: &GrayImage) -> f64 {
        let (w, h) = (image.width() as usize, image.height() as usize);
        if w < 3 || h < 3 {
            return 0.0;
        }

        let px = image.as_raw();
        let mut total = 0.0f64;
        for y in 1..h - 1 {
            let row = y * w;
            for x in 1..w - 1 {
                let i = row + x;
                let lap = 4 * px[i] as i32
                    - px[i - 1] as i32
                    - px[i + 1] as i32
                    - px[i - w] as i32
                    - px[i + w] as i32;
                total += lap.unsigned_abs() as f64;
            }
        }

        total / ((w - 2) * (h - 2)) as f64
    }
}

impl BlurEstimator for LaplacianEstimator {
    fn name(&self) -> &'static str {
        "laplacian"
    }

    fn estimate(&self, image: &GrayImage) -> f32 {
        let energy = Self::edge_energy(image);
        (1.0 - energy / 255.0).clamp(0.0, 1.0) as f32
    }

    fn is_blurry(&self, score: f32, threshold: f32) -> bool {
        score > threshold
    }
}

/// Population mean and variance of pixel intensities (0-255 scale).
pub(crate) fn intensity_mean_variance(image: &GrayImage) -> (f64, f64) {
    let px = image.as_raw();
    if px.is_empty() {
        return (0.0, 0.0);
    }

    let n = px.len() as f64;
    let mean = px.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = px
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    (mean, variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn checkerboard(size: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn test_uniform_image_is_maximally_blurry_under_laplacian() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        assert_eq!(LaplacianEstimator.estimate(&img), 1.0);
        assert!(LaplacianEstimator.is_blurry(1.0, 0.15));
    }

    #[test]
    fn test_uniform_image_has_zero_variance() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        assert_eq!(GlobalVarianceEstimator.estimate(&img), 0.0);
        assert!(GlobalVarianceEstimator.is_blurry(0.0, 0.15));
    }

    #[test]
    fn test_checkerboard_is_sharp_under_laplacian() {
        let img = checkerboard(64);
        assert_eq!(LaplacianEstimator::edge_energy(&img), 1020.0);
        assert_eq!(LaplacianEstimator.estimate(&img), 0.0);
        assert!(!LaplacianEstimator.is_blurry(0.0, 0.15));
    }

    #[test]
    fn test_checkerboard_variance_is_quarter_scale() {
        let img = checkerboard(64);
        let score = GlobalVarianceEstimator.estimate(&img);
        assert!((score - 0.25).abs() < 1e-6);
        assert!(!GlobalVarianceEstimator.is_blurry(score, 0.15));
    }

    #[test]
    fn test_variance_ignores_edges() {
        // Same tonal spread, wildly different edge content: the variance
        // estimator cannot tell a hard split from a fine checkerboard.
        let split = GrayImage::from_fn(64, 64, |x, _| if x < 32 { Luma([0]) } else { Luma([255]) });
        let board = checkerboard(64);

        let a = GlobalVarianceEstimator.estimate(&split);
        let b = GlobalVarianceEstimator.estimate(&board);
        assert!((a - b).abs() < 1e-6);

        assert!(LaplacianEstimator.estimate(&split) > LaplacianEstimator.estimate(&board));
    }

    #[test]
    fn test_tiny_images_have_no_interior() {
        let img = GrayImage::from_pixel(2, 10, Luma([0]));
        assert_eq!(LaplacianEstimator::edge_energy(&img), 0.0);
        assert_eq!(LaplacianEstimator.estimate(&img), 1.0);
        assert_eq!(GlobalVarianceEstimator.estimate(&GrayImage::new(0, 0)), 0.0);
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        let noise = GrayImage::from_fn(50, 37, |x, y| Luma([((x * 131 + y * 71) % 256) as u8]));
        for strategy in [BlurStrategy::Variance, BlurStrategy::Laplacian] {
            let score = strategy.estimator().estimate(&noise);
            assert!((0.0..=1.0).contains(&score), "{} gave {}", strategy, score);
        }
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(BlurStrategy::Variance.estimator().name(), "variance");
        assert_eq!(BlurStrategy::Laplacian.estimator().name(), "laplacian");
        assert_eq!(BlurStrategy::default(), BlurStrategy::Variance);
    }
}
