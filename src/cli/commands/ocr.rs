//! Plain text extraction with one backend.

use std::path::Path;

use console::style;

use super::readability::resolve_backend;
use crate::cli::helpers::{print_json, read_image, spinner};
use crate::config::Config;

pub async fn cmd_ocr(
    config: &Config,
    file: &Path,
    backend: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let bytes = read_image(file).await?;
    let backend = resolve_backend(config, backend)?;

    let pb = spinner(format!("Running {}...", backend.backend_type()), json);
    let result = backend.ocr_image(&bytes).await;
    pb.finish_and_clear();
    let result = result?;

    if json {
        return print_json(&result);
    }

    let confidence = result
        .confidence
        .map(|c| format!(", confidence {:.1}%", c * 100.0))
        .unwrap_or_default();
    eprintln!(
        "{} {}{} in {}ms",
        style("✓").green(),
        result.backend,
        confidence,
        result.processing_time_ms
    );
    println!("{}", result.text);

    Ok(())
}
