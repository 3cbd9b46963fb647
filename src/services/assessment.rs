//! Document assessment service.
//!
//! Request-level orchestration over the scorer and the recognition backends:
//! decode, size gate, metrics, then (readability path) recognition and score.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

use crate::ocr::{OcrBackend, OcrResult};
use crate::quality::{
    compute_quality_metrics, BlurCheckReport, BlurStrategy, QualityConfig, QualityError,
    RasterImage, ReadabilityAnalyzer, ReadabilityResult,
};
use crate::timing::ProcessingLog;

/// Quality-only path: decode, size gate, metrics, blur decision.
pub fn check_blur(
    bytes: &[u8],
    strategy: BlurStrategy,
    config: &QualityConfig,
) -> Result<BlurCheckReport, QualityError> {
    let image = RasterImage::decode(bytes)?;
    image.ensure_min_size(config.min_document_size)?;

    let estimator = strategy.estimator();
    let metrics = compute_quality_metrics(&image, estimator);
    let is_blurry = estimator.is_blurry(metrics.blur_score, config.blur_threshold);

    debug!(
        "Blur check ({}): score={:.4} threshold={} blurry={}",
        strategy, metrics.blur_score, config.blur_threshold, is_blurry
    );

    Ok(BlurCheckReport::new(
        &metrics,
        image.byte_size(),
        is_blurry,
        config.blur_threshold,
    ))
}

/// Readability path. The size gate runs before any recognition call.
///
/// Decoding and scoring run on the blocking pool; only the recognition call
/// is awaited on the caller's executor.
pub async fn assess_readability(
    bytes: &[u8],
    backend: &dyn OcrBackend,
    config: &QualityConfig,
) -> Result<ReadabilityResult, QualityError> {
    let analyzer = ReadabilityAnalyzer::new(config.clone());

    let image = {
        let analyzer = analyzer.clone();
        let owned = bytes.to_vec();
        tokio::task::spawn_blocking(move || analyzer.prepare(&owned)).await??
    };

    let ocr = backend.ocr_image(bytes).await?;
    debug!(
        "{} recognized {} chars in {}ms",
        ocr.backend,
        ocr.text.len(),
        ocr.processing_time_ms
    );

    let confidence = ocr.confidence_percent();
    let result =
        tokio::task::spawn_blocking(move || analyzer.evaluate(&image, &ocr.text, confidence)).await?;
    Ok(result)
}

/// Outcome of one method in a comparison run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodOutcome<T> {
    pub method: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> MethodOutcome<T> {
    fn from_result<E: std::fmt::Display>(method: impl Into<String>, result: Result<T, E>) -> Self {
        let method = method.into();
        match result {
            Ok(value) => Self {
                method,
                success: true,
                result: Some(value),
                error: None,
            },
            Err(e) => Self {
                method,
                success: false,
                result: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Every method run against one image, plus how long each took.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub blur: MethodOutcome<BlurCheckReport>,
    pub recognitions: Vec<MethodOutcome<OcrResult>>,
    pub processing_times: ProcessingLog,
}

/// Run the blur analyzer and every backend against the same image concurrently.
///
/// Failures are captured per method; one failing backend never hides the others.
pub async fn compare(
    bytes: Arc<Vec<u8>>,
    backends: &[Arc<dyn OcrBackend>],
    config: &QualityConfig,
) -> Comparison {
    info!("Comparing blur analyzer and {} OCR backend(s)", backends.len());

    let blur_task = {
        let bytes = Arc::clone(&bytes);
        let config = config.clone();
        async move {
            let start = Instant::now();
            let result = tokio::task::spawn_blocking(move || {
                check_blur(&bytes, config.estimator, &config).map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| format!("Blur analysis task failed: {}", e))
            .and_then(|r| r);
            (result, start.elapsed().as_secs_f64() * 1000.0)
        }
    };

    let ocr_tasks = backends.iter().map(|backend| {
        let bytes = Arc::clone(&bytes);
        async move {
            let start = Instant::now();
            let result = backend.ocr_image(&bytes).await;
            (backend.name(), result, start.elapsed().as_secs_f64() * 1000.0)
        }
    });

    let ((blur_result, blur_ms), ocr_results) = tokio::join!(blur_task, join_all(ocr_tasks));

    let mut log = ProcessingLog::new();
    log.record("blur", blur_ms);
    let blur = MethodOutcome::from_result("blur", blur_result);

    let recognitions = ocr_results
        .into_iter()
        .map(|(name, result, ms)| {
            // A chain is labelled by whichever member produced the text.
            let method = match &result {
                Ok(ocr) => ocr.backend.as_str().to_string(),
                Err(_) => name,
            };
            log.record(method.as_str(), ms);
            MethodOutcome::from_result(method, result)
        })
        .collect();

    Comparison {
        blur,
        recognitions,
        processing_times: log,
    }
}
