//! End-to-end checks of the scoring paths against generated images.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::{GrayImage, ImageFormat, Luma, RgbImage};

use scanlens::ocr::{OcrBackend, OcrBackendType, OcrError, OcrResult};
use scanlens::quality::{
    BlurEstimator, BlurStrategy, GlobalVarianceEstimator, LaplacianEstimator, QualityConfig,
    QualityError, RasterImage,
};
use scanlens::services::{assess_readability, check_blur};

fn encode_png(img: &GrayImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn checkerboard(size: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| {
        Luma([if (x + y) % 2 == 0 { 0 } else { 255 }])
    })
}

/// Recognition stub that records how often it was called.
struct CountingBackend {
    words: usize,
    confidence: f32,
    calls: AtomicUsize,
}

impl CountingBackend {
    fn new(words: usize, confidence: f32) -> Self {
        Self {
            words,
            confidence,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl OcrBackend for CountingBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "test double".to_string()
    }

    async fn ocr_image(&self, _image: &[u8]) -> Result<OcrResult, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(OcrResult {
            text: vec!["word"; self.words].join(" "),
            confidence: Some(self.confidence),
            backend: OcrBackendType::Tesseract,
            model: None,
            processing_time_ms: 0,
        })
    }
}

#[test]
fn checkerboard_scores_under_both_estimators() {
    let board = checkerboard(64);

    let variance = GlobalVarianceEstimator.estimate(&board);
    assert!((variance - 0.25).abs() < 1e-6);
    assert!(!GlobalVarianceEstimator.is_blurry(variance, 0.15));

    let laplacian = LaplacianEstimator.estimate(&board);
    assert_eq!(laplacian, 0.0);
    assert!(!LaplacianEstimator.is_blurry(laplacian, 0.15));
}

#[test]
fn uniform_gray_is_blurry_under_both_estimators() {
    let flat = GrayImage::from_pixel(64, 64, Luma([128]));

    let variance = GlobalVarianceEstimator.estimate(&flat);
    assert_eq!(variance, 0.0);
    assert!(GlobalVarianceEstimator.is_blurry(variance, 0.15));

    let laplacian = LaplacianEstimator.estimate(&flat);
    assert_eq!(laplacian, 1.0);
    assert!(LaplacianEstimator.is_blurry(laplacian, 0.15));
}

#[test]
fn scores_stay_in_unit_range() {
    let images = [
        GrayImage::from_fn(50, 30, |x, _| Luma([(x * 5) as u8])),
        GrayImage::from_fn(7, 90, |x, y| Luma([((x * 37 + y * 11) % 256) as u8])),
        GrayImage::from_pixel(2, 2, Luma([255])),
        GrayImage::new(1, 1),
        checkerboard(9),
    ];

    for img in &images {
        for strategy in [BlurStrategy::Variance, BlurStrategy::Laplacian] {
            let score = strategy.estimator().estimate(img);
            assert!(
                (0.0..=1.0).contains(&score),
                "{} score {} out of range for {}x{}",
                strategy,
                score,
                img.width(),
                img.height()
            );
        }
    }
}

#[test]
fn color_input_is_scored_in_grayscale() {
    let rgb = RgbImage::from_fn(400, 400, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgb([0, 0, 0])
        } else {
            image::Rgb([255, 255, 255])
        }
    });
    let mut buf = Cursor::new(Vec::new());
    rgb.write_to(&mut buf, ImageFormat::Png).unwrap();

    let report = check_blur(buf.get_ref(), BlurStrategy::Variance, &QualityConfig::default()).unwrap();
    assert!((report.blur_score - 0.25).abs() < 1e-4);
    assert!((report.quality.contrast - 0.5).abs() < 1e-3);
}

#[tokio::test]
async fn small_image_rejected_before_recognition() {
    let backend = CountingBackend::new(50, 0.9);
    let bytes = encode_png(&checkerboard(200));

    let err = assess_readability(&bytes, &backend, &QualityConfig::default())
        .await
        .unwrap_err();

    match err {
        QualityError::ResolutionTooLow {
            width,
            height,
            min_width,
            min_height,
        } => {
            assert_eq!((width, height), (200, 200));
            assert_eq!((min_width, min_height), (400, 400));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sharp_confident_document_is_readable() {
    let backend = CountingBackend::new(50, 0.9);
    let bytes = encode_png(&checkerboard(400));

    let result = assess_readability(&bytes, &backend, &QualityConfig::default())
        .await
        .unwrap();

    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.word_count, 50);
    assert!((result.confidence_score - 90.0).abs() < 1e-3);
    assert!(result.readability_score >= 70.0);
    assert!((result.readability_score - 86.0).abs() < 1e-3);
    assert!(result.is_readable);

    let report = serde_json::to_value(result.to_report()).unwrap();
    assert_eq!(report["isReadable"], true);
    assert_eq!(report["details"]["wordCount"], 50);
    assert_eq!(report["details"]["metadata"]["format"], "png");
}

#[tokio::test]
async fn low_confidence_blocks_readable_flag() {
    let backend = CountingBackend::new(50, 0.55);
    let bytes = encode_png(&checkerboard(400));

    let result = assess_readability(&bytes, &backend, &QualityConfig::default())
        .await
        .unwrap();

    // 22 + 30 + 10 + 10: score clears the bar, confidence does not.
    assert!(result.readability_score >= 70.0);
    assert!(!result.is_readable);
    assert!(result
        .suggestions
        .iter()
        .any(|s| s.contains("confidence is low")));
}

#[test]
fn raster_from_gray_reports_raw_size() {
    let raster = RasterImage::from_gray(checkerboard(10), "raw");
    assert_eq!(raster.byte_size(), 100);
    assert_eq!(raster.format(), "raw");
}
