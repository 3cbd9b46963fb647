//! Side-by-side comparison of the blur analyzer and OCR backends.

use std::path::Path;
use std::sync::Arc;

use console::style;

use crate::cli::helpers::{print_json, read_image, spinner, truncate};
use crate::config::Config;
use crate::ocr::{create_backend, OcrBackend, OcrBackendType};
use crate::services::compare;

const WIDTH: usize = 100;

fn parse_backends(config: &Config, list: Option<&str>) -> anyhow::Result<Vec<Arc<dyn OcrBackend>>> {
    let Some(list) = list else {
        return Ok(config.ocr.build_backends()?);
    };

    let settings = config.ocr.settings();
    let mut backends = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let backend_type = OcrBackendType::from_str(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown backend '{}'. Known backends: {}",
                name,
                OcrBackendType::ALL.map(|b| b.as_str()).join(", ")
            )
        })?;
        backends.push(create_backend(backend_type, &settings));
    }
    if backends.is_empty() {
        anyhow::bail!("No backends given");
    }
    Ok(backends)
}

pub async fn cmd_compare(
    config: &Config,
    file: &Path,
    backends: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let bytes = Arc::new(read_image(file).await?);
    let backends = parse_backends(config, backends)?;

    let pb = spinner(
        format!("Running blur analysis and {} backend(s)...", backends.len()),
        json,
    );
    let comparison = compare(bytes, &backends, &config.quality).await;
    pb.finish_and_clear();

    if json {
        return print_json(&comparison);
    }

    println!("{}", "═".repeat(WIDTH));
    println!("Comparison: {}", file.display());
    println!("{}", "═".repeat(WIDTH));

    println!("\n{}", style("── Blur analysis ").bold());
    match (&comparison.blur.result, &comparison.blur.error) {
        (Some(report), _) => println!(
            "  score {:.4} ({}) - {}",
            report.blur_score,
            if report.is_blurry { "blurry" } else { "sharp" },
            report.recommendation
        ),
        (None, Some(error)) => println!("  {} {}", style("✗").red(), error),
        (None, None) => {}
    }

    for outcome in &comparison.recognitions {
        println!("\n{}", style(format!("── {} ", outcome.method)).bold());
        match (&outcome.result, &outcome.error) {
            (Some(result), _) => {
                let confidence = result
                    .confidence
                    .map(|c| format!("{:.1}%", c * 100.0))
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "  {} {} words, confidence {}",
                    style("✓").green(),
                    result.text.split_whitespace().count(),
                    confidence
                );
                for line in result.text.lines().filter(|l| !l.trim().is_empty()).take(8) {
                    println!("  │ {}", truncate(line.trim(), WIDTH - 4));
                }
            }
            (None, Some(error)) => println!("  {} {}", style("✗").red(), error),
            (None, None) => {}
        }
    }

    println!("\n{}", style("Processing times").cyan());
    println!("{}", "─".repeat(40));
    for record in comparison.processing_times.records() {
        println!("  {:<12} {:>10.1} ms", record.method, record.duration_ms);
    }
    println!("{}", "─".repeat(40));
    println!(
        "  {:<12} {:>10.1} ms",
        "total",
        comparison.processing_times.total_ms()
    );

    Ok(())
}
