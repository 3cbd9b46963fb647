//! Configuration management for scanlens using the prefer crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ocr::{backend_from_spec, OcrBackend, OcrError, OcrSettings};
use crate::quality::QualityConfig;

/// A backend entry - either a single backend or a fallback chain.
///
/// Examples:
/// - `"tesseract"` - single backend
/// - `["gemini", "tesseract"]` - fallback chain, tries gemini first, tesseract if it fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackendEntry {
    /// Single backend.
    Single(String),
    /// Fallback chain - tries backends in order until one succeeds.
    Chain(Vec<String>),
}

impl BackendEntry {
    /// Get all backend names in this entry.
    pub fn backends(&self) -> Vec<&str> {
        match self {
            BackendEntry::Single(s) => vec![s.as_str()],
            BackendEntry::Chain(v) => v.iter().map(|s| s.as_str()).collect(),
        }
    }

    /// Check if this is a fallback chain (multiple backends).
    pub fn is_chain(&self) -> bool {
        matches!(self, BackendEntry::Chain(v) if v.len() > 1)
    }

    /// Comma-separated form accepted by `backend_from_spec`.
    pub fn spec(&self) -> String {
        self.backends().join(",")
    }
}

/// OCR backend configuration.
///
/// Each entry in `backends` is either a string (single backend) or an array
/// (fallback chain). Example: `["tesseract", ["gemini", "ocrspace"]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Backend entries; the first one drives the readability check.
    #[serde(default = "default_ocr_backends")]
    pub backends: Vec<BackendEntry>,
    /// Recognition language (Tesseract code, e.g. "eng").
    #[serde(default = "default_language")]
    pub language: String,
    /// Per-request timeout for hosted APIs.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Gemini model override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_model: Option<String>,
    /// AWS region for Textract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
}

fn default_ocr_backends() -> Vec<BackendEntry> {
    vec![BackendEntry::Single("tesseract".to_string())]
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backends: default_ocr_backends(),
            language: default_language(),
            request_timeout_secs: default_request_timeout_secs(),
            gemini_model: None,
            aws_region: None,
        }
    }
}

impl OcrConfig {
    /// Settings handed to every backend constructor.
    pub fn settings(&self) -> OcrSettings {
        OcrSettings {
            language: self.language.clone(),
            request_timeout_secs: self.request_timeout_secs,
            gemini_model: self.gemini_model.clone(),
            aws_region: self.aws_region.clone(),
        }
    }

    /// Instantiate one backend (or fallback chain) per entry.
    pub fn build_backends(&self) -> Result<Vec<Arc<dyn OcrBackend>>, OcrError> {
        let settings = self.settings();
        self.backends
            .iter()
            .map(|entry| backend_from_spec(&entry.spec(), &settings))
            .collect()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Scoring thresholds.
    #[serde(default)]
    pub quality: QualityConfig,
    /// Recognition backends.
    #[serde(default)]
    pub ocr: OcrConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers scanlens config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("scanlens").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}; using defaults", e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(_) => {
                // No config file found, use defaults with env overrides
                Self::default_with_env()
            }
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        debug!("Loaded config from {}", path.display());
        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    /// Apply `SCANLENS_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        self.quality = self.quality.with_env_overrides();
        self
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))
    }
}
