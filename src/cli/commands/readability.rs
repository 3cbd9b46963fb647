//! Readability check: OCR plus image quality scoring.

use std::path::Path;
use std::sync::Arc;

use console::style;
use tracing::info;

use crate::cli::helpers::{percent, print_json, read_image, spinner, status_mark, truncate};
use crate::config::Config;
use crate::ocr::{backend_from_spec, OcrBackend};
use crate::quality::DocumentSize;
use crate::services::assess_readability;

/// Threshold overrides from the command line.
pub struct Overrides {
    pub min_size: Option<DocumentSize>,
    pub min_confidence: Option<f32>,
    pub min_text_length: Option<usize>,
}

/// Resolve the backend named on the command line, or the first configured one.
pub(super) fn resolve_backend(
    config: &Config,
    spec: Option<&str>,
) -> anyhow::Result<Arc<dyn OcrBackend>> {
    match spec {
        Some(spec) => Ok(backend_from_spec(spec, &config.ocr.settings())?),
        None => config
            .ocr
            .build_backends()?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No OCR backends configured")),
    }
}

pub async fn cmd_readability(
    config: &Config,
    file: &Path,
    backend: Option<&str>,
    overrides: Overrides,
    json: bool,
) -> anyhow::Result<()> {
    let bytes = read_image(file).await?;

    let mut quality = config.quality.clone();
    if let Some(min_size) = overrides.min_size {
        quality.min_document_size = min_size;
    }
    if let Some(min_confidence) = overrides.min_confidence {
        quality.min_confidence = min_confidence;
    }
    if let Some(min_text_length) = overrides.min_text_length {
        quality.min_text_length = min_text_length;
    }

    let backend = resolve_backend(config, backend)?;
    info!("Readability check with {}", backend.backend_type());

    let pb = spinner(
        format!("Reading {} with {}...", file.display(), backend.backend_type()),
        json,
    );
    let result = assess_readability(&bytes, backend.as_ref(), &quality).await;
    pb.finish_and_clear();
    let result = result?;

    if json {
        return print_json(&result.to_report());
    }

    let verdict = if result.is_readable {
        "Readable"
    } else {
        "Not readable"
    };
    println!(
        "{} {} (score {:.1}/100)",
        status_mark(result.is_readable),
        style(verdict).bold(),
        result.readability_score
    );
    println!(
        "  {} Words: {}  OCR confidence: {:.1}",
        style("→").dim(),
        result.word_count,
        result.confidence_score
    );
    println!(
        "  {} Blur: {:.3}  Brightness: {}  Contrast: {}",
        style("→").dim(),
        result.quality_metrics.blur_score,
        percent(result.quality_metrics.brightness),
        percent(result.quality_metrics.contrast)
    );

    if !result.suggestions.is_empty() {
        println!("\n{}", style("Suggestions:").cyan());
        for suggestion in &result.suggestions {
            println!("  - {}", suggestion);
        }
    }

    if !result.extracted_text.trim().is_empty() {
        println!("\n{}", style("Extracted text:").cyan());
        for line in result.extracted_text.lines().take(10) {
            println!("  {}", truncate(line, 100));
        }
    }

    Ok(())
}
