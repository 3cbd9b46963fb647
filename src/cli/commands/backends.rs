//! OCR backend availability report.

use console::style;

use crate::cli::helpers::status_mark;
use crate::config::Config;
use crate::ocr::{OcrBackendType, OcrManager};

pub async fn cmd_backends(config: &Config) -> anyhow::Result<()> {
    let primary = config
        .ocr
        .backends
        .first()
        .and_then(|entry| entry.backends().first().copied())
        .and_then(OcrBackendType::from_str)
        .unwrap_or(OcrBackendType::Tesseract);

    let manager = OcrManager::with_all_backends(primary, &config.ocr.settings());

    println!("\n{}", style("OCR Backends").bold());
    println!("{}", "-".repeat(50));

    for backend in manager.backends() {
        let kind = backend.backend_type();
        let marker = if kind == primary { " (primary)" } else { "" };
        println!(
            "  {} {:<10}{} {}",
            status_mark(backend.is_available()),
            kind.as_str(),
            style(marker).cyan(),
            style(backend.availability_hint()).dim()
        );
    }

    let available = manager.available_backends().count();
    println!();
    if available == 0 {
        println!(
            "{} No backends available. Install tesseract or set an API key.",
            style("!").yellow()
        );
    } else {
        println!(
            "{} {} of {} backends ready",
            style("✓").green(),
            available,
            OcrBackendType::ALL.len()
        );
    }

    Ok(())
}
