//! Scoring thresholds passed explicitly into every scoring call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::blur::BlurStrategy;

/// Default blur threshold.
pub const DEFAULT_BLUR_THRESHOLD: f32 = 0.15;

/// Default minimum OCR confidence (0-100).
pub const DEFAULT_MIN_CONFIDENCE: f32 = 60.0;

/// Default minimum extracted text length, in characters.
pub const DEFAULT_MIN_TEXT_LENGTH: usize = 10;

/// Minimum width/height an image must have to be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSize {
    pub width: u32,
    pub height: u32,
}

impl DocumentSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Stricter policy used for photographed document captures.
    pub const fn document_capture() -> Self {
        Self::new(800, 500)
    }

    /// Whether an image of the given dimensions satisfies this minimum.
    pub fn admits(&self, width: u32, height: u32) -> bool {
        width >= self.width && height >= self.height
    }
}

impl Default for DocumentSize {
    fn default() -> Self {
        Self::new(400, 400)
    }
}

impl fmt::Display for DocumentSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for DocumentSize {
    type Err = String;

    /// Parses `WIDTHxHEIGHT`, e.g. `800x500`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("invalid size '{}', expected WIDTHxHEIGHT", s))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid width '{}': {}", w, e))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid height '{}': {}", h, e))?;
        Ok(Self::new(width, height))
    }
}

/// Thresholds for the quality and readability paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Blur decision threshold, interpreted by the selected estimator.
    #[serde(default = "default_blur_threshold")]
    pub blur_threshold: f32,
    /// Images below this size are rejected before scoring.
    #[serde(default)]
    pub min_document_size: DocumentSize,
    /// Minimum OCR confidence (0-100) for an image to count as readable.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// Minimum extracted text length for an image to count as readable.
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,
    /// Blur estimator used by the quality-only path.
    #[serde(default)]
    pub estimator: BlurStrategy,
}

fn default_blur_threshold() -> f32 {
    DEFAULT_BLUR_THRESHOLD
}

fn default_min_confidence() -> f32 {
    DEFAULT_MIN_CONFIDENCE
}

fn default_min_text_length() -> usize {
    DEFAULT_MIN_TEXT_LENGTH
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            blur_threshold: DEFAULT_BLUR_THRESHOLD,
            min_document_size: DocumentSize::default(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_text_length: DEFAULT_MIN_TEXT_LENGTH,
            estimator: BlurStrategy::default(),
        }
    }
}

impl QualityConfig {
    /// Check if this is the default config.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply `SCANLENS_*` environment overrides on top of this config.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<f32>("SCANLENS_BLUR_THRESHOLD") {
            self.blur_threshold = v;
        }
        if let Some(v) = env_parse::<f32>("SCANLENS_MIN_CONFIDENCE") {
            self.min_confidence = v;
        }
        if let Some(v) = env_parse::<usize>("SCANLENS_MIN_TEXT_LENGTH") {
            self.min_text_length = v;
        }
        if let Some(v) = env_parse::<DocumentSize>("SCANLENS_MIN_SIZE") {
            self.min_document_size = v;
        }
        self
    }
}

fn env_parse<T: FromStr>(var: &str) -> Option<T> {
    let raw = std::env::var(var).ok().filter(|s| !s.is_empty())?;
    match raw.parse::<T>() {
        Ok(v) => {
            tracing::debug!("Using {} from environment: {}", var, raw);
            Some(v)
        }
        Err(_) => {
            tracing::warn!("Ignoring invalid {} value: {}", var, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_size_parse() {
        assert_eq!("800x500".parse::<DocumentSize>().unwrap(), DocumentSize::new(800, 500));
        assert_eq!(" 640X480 ".parse::<DocumentSize>().unwrap(), DocumentSize::new(640, 480));
        assert!("800".parse::<DocumentSize>().is_err());
        assert!("axb".parse::<DocumentSize>().is_err());
    }

    #[test]
    fn test_document_size_admits() {
        let min = DocumentSize::default();
        assert!(min.admits(400, 400));
        assert!(min.admits(1200, 900));
        assert!(!min.admits(399, 800));
        assert!(!min.admits(800, 200));
    }

    #[test]
    fn test_defaults() {
        let config = QualityConfig::default();
        assert_eq!(config.blur_threshold, 0.15);
        assert_eq!(config.min_document_size, DocumentSize::new(400, 400));
        assert_eq!(config.min_confidence, 60.0);
        assert_eq!(config.min_text_length, 10);
        assert!(config.is_default());
        assert_eq!(DocumentSize::document_capture().to_string(), "800x500");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: QualityConfig = toml::from_str("blur_threshold = 0.3").unwrap();
        assert_eq!(config.blur_threshold, 0.3);
        assert_eq!(config.min_confidence, 60.0);
        assert_eq!(config.min_document_size, DocumentSize::default());
    }
}
