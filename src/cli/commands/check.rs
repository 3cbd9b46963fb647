//! Quality-only blur check.

use std::path::Path;

use console::style;

use crate::cli::helpers::{percent, print_json, read_image, status_mark};
use crate::config::Config;
use crate::quality::{BlurStrategy, DocumentSize};
use crate::services::check_blur;

pub async fn cmd_check(
    config: &Config,
    file: &Path,
    estimator: Option<BlurStrategy>,
    threshold: Option<f32>,
    min_size: Option<DocumentSize>,
    json: bool,
) -> anyhow::Result<()> {
    let bytes = read_image(file).await?;

    let mut quality = config.quality.clone();
    if let Some(threshold) = threshold {
        quality.blur_threshold = threshold;
    }
    if let Some(min_size) = min_size {
        quality.min_document_size = min_size;
    }
    let strategy = estimator.unwrap_or(quality.estimator);

    let report =
        tokio::task::spawn_blocking(move || check_blur(&bytes, strategy, &quality)).await??;

    if json {
        return print_json(&report);
    }

    println!(
        "{} {}",
        status_mark(!report.is_blurry),
        style(&report.recommendation).bold()
    );
    println!(
        "  {} Blur score: {:.4} ({} estimator, threshold {})",
        style("→").dim(),
        report.blur_score,
        strategy,
        report.threshold
    );
    println!(
        "  {} Brightness: {}  Contrast: {}",
        style("→").dim(),
        percent(report.quality.brightness),
        percent(report.quality.contrast)
    );
    println!(
        "  {} {}x{} {}, {} bytes",
        style("→").dim(),
        report.quality.width,
        report.quality.height,
        report.quality.format,
        report.quality.size
    );

    Ok(())
}
