//! Image quality and readability scoring.
//!
//! Reference-free estimate of whether a scanned or photographed document is
//! fit for text extraction:
//! - brightness and contrast from grayscale intensity statistics
//! - blur via one of two [`BlurEstimator`] strategies
//! - a 0-100 readability score combining the above with OCR confidence and
//!   word count, plus rule-based suggestions
//!
//! Everything here is synchronous and pure. Each call owns its decoded
//! raster, so concurrent calls need no coordination.

mod blur;
mod config;
mod error;
mod metrics;
mod raster;
mod readability;
mod report;

pub use blur::{BlurEstimator, BlurStrategy, GlobalVarianceEstimator, LaplacianEstimator};
pub use config::{
    DocumentSize, QualityConfig, DEFAULT_BLUR_THRESHOLD, DEFAULT_MIN_CONFIDENCE,
    DEFAULT_MIN_TEXT_LENGTH,
};
pub use error::QualityError;
pub use metrics::{compute_quality_metrics, QualityMetrics};
pub use raster::RasterImage;
pub use readability::{
    compute_readability_score, count_words, generate_suggestions, ReadabilityAnalyzer,
    ReadabilityResult, READABLE_SCORE,
};
pub use report::{
    BlurCheckReport, ErrorReport, ImageMetadata, QualityInfo, ReadabilityDetails,
    ReadabilityReport,
};
