//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction.
//! Output is requested in TSV form so per-word confidences can be averaged.

use std::io::Write;
use std::time::Instant;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;

use super::backend::{OcrBackend, OcrBackendType, OcrError, OcrResult, OcrSettings};
use super::model_utils::check_binary;

/// Tesseract OCR backend.
pub struct TesseractBackend {
    settings: OcrSettings,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default settings.
    pub fn new() -> Self {
        Self {
            settings: OcrSettings::default(),
        }
    }

    /// Create a new Tesseract backend with custom settings.
    pub fn with_settings(settings: OcrSettings) -> Self {
        Self { settings }
    }

    /// Run Tesseract on an image file, returning raw TSV output.
    async fn run_tesseract(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(image)?;
        tmp.flush()?;

        let output = Command::new("tesseract")
            .arg(tmp.path())
            .arg("stdout")
            .args(["-l", &self.settings.language])
            .arg("tsv")
            .output()
            .await;

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr.trim())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Text and mean word confidence (0.0 - 1.0) recovered from Tesseract TSV.
#[derive(Debug, Clone, PartialEq)]
pub struct TsvText {
    pub text: String,
    pub confidence: Option<f32>,
}

/// Parse `tesseract ... tsv` output.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Only level-5 (word) rows carry
/// text; rows with conf -1 are layout-only.
pub fn parse_tsv(tsv: &str) -> TsvText {
    let mut lines: Vec<String> = Vec::new();
    let mut current_key: Option<(u32, u32, u32, u32)> = None;
    let mut current_words: Vec<&str> = Vec::new();
    let mut conf_sum = 0.0f64;
    let mut conf_count = 0usize;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        let num = |i: usize| cols[i].parse::<u32>().unwrap_or(0);
        let key = (num(1), num(2), num(3), num(4));
        if current_key != Some(key) {
            if !current_words.is_empty() {
                lines.push(current_words.join(" "));
                current_words.clear();
            }
            current_key = Some(key);
        }
        current_words.push(word);

        if let Ok(conf) = cols[10].parse::<f64>() {
            if conf >= 0.0 {
                conf_sum += conf;
                conf_count += 1;
            }
        }
    }
    if !current_words.is_empty() {
        lines.push(current_words.join(" "));
    }

    let confidence = if conf_count > 0 {
        Some(((conf_sum / conf_count as f64) / 100.0).clamp(0.0, 1.0) as f32)
    } else {
        None
    };

    TsvText {
        text: lines.join("\n"),
        confidence,
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else {
            format!("Tesseract is available (language: {})", self.settings.language)
        }
    }

    async fn ocr_image(&self, image: &[u8]) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let tsv = self.run_tesseract(image).await?;
        let parsed = parse_tsv(&tsv);
        let elapsed = start.elapsed();

        Ok(OcrResult {
            text: parsed.text,
            confidence: parsed.confidence,
            backend: OcrBackendType::Tesseract,
            model: None, // Tesseract doesn't have model variants
            processing_time_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_parse_tsv_groups_lines() {
        let tsv = format!(
            "{}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t\n\
             4\t1\t1\t1\t1\t0\t10\t10\t200\t20\t-1\t\n\
             5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t96.5\tInvoice\n\
             5\t1\t1\t1\t1\t2\t70\t10\t50\t20\t91.5\t#1042\n\
             5\t1\t1\t1\t2\t1\t10\t40\t50\t20\t88\tTotal:\n\
             5\t1\t1\t1\t2\t2\t70\t40\t50\t20\t84\t$12.00\n",
            HEADER
        );

        let parsed = parse_tsv(&tsv);
        assert_eq!(parsed.text, "Invoice #1042\nTotal: $12.00");
        assert!((parsed.confidence.unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_parse_tsv_skips_blank_words() {
        let tsv = format!(
            "{}\n5\t1\t1\t1\t1\t1\t0\t0\t1\t1\t-1\t \n5\t1\t1\t1\t1\t2\t0\t0\t1\t1\t70\tok\n",
            HEADER
        );
        let parsed = parse_tsv(&tsv);
        assert_eq!(parsed.text, "ok");
        assert!((parsed.confidence.unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_parse_tsv_empty() {
        let parsed = parse_tsv(HEADER);
        assert_eq!(parsed.text, "");
        assert_eq!(parsed.confidence, None);
    }

    #[test]
    fn test_hint_mentions_install_when_missing() {
        let backend = TesseractBackend::new();
        if !backend.is_available() {
            assert!(backend.availability_hint().contains("apt install"));
        }
    }
}
