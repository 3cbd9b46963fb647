//! Shared infrastructure for hosted OCR backends (OCR.space, Gemini, Textract).
//!
//! Provides common helpers for image encoding, HTTP client setup,
//! rate limiting and retry logic.

use std::future::Future;
use std::time::Duration;

use base64::Engine;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use super::backend::{OcrBackendType, OcrError};
use crate::rate_limit::{backoff_delay, get_delay_from_env, parse_retry_after};

/// Maximum retry attempts on rate limit (429) errors.
const MAX_RETRIES: u32 = 5;

/// Shared OCR prompt for vision API backends.
pub const VISION_OCR_PROMPT: &str = "Extract all text from this image. Return only the extracted text, preserving the original layout and formatting as much as possible. Do not add any explanations or commentary.";

/// Sniff the MIME type of encoded image bytes, defaulting to JPEG.
pub fn image_mime_type(image: &[u8]) -> &'static str {
    infer::get(image)
        .map(|t| t.mime_type())
        .filter(|m| m.starts_with("image/"))
        .unwrap_or("image/jpeg")
}

/// Encode image bytes as base64, returning (base64_data, mime_type).
pub fn encode_image_base64(image: &[u8]) -> (String, &'static str) {
    let data = base64::engine::general_purpose::STANDARD.encode(image);
    (data, image_mime_type(image))
}

/// Build an HTTP client for a hosted backend.
pub fn create_client(timeout_secs: u64) -> Result<Client, OcrError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("scanlens/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| OcrError::OcrFailed(format!("Failed to create HTTP client: {}", e)))
}

/// Apply a configurable rate-limiting delay before an API request.
pub async fn apply_rate_delay(env_var: &str, default_ms: u64, backend_name: &str) {
    let delay = get_delay_from_env(env_var, default_ms);
    if delay > Duration::ZERO {
        debug!("{}: waiting {:?} before request", backend_name, delay);
        tokio::time::sleep(delay).await;
    }
}

/// Retry an API request on 429 (rate limited) responses with exponential backoff.
///
/// Returns the first non-429 response. If all retries are exhausted,
/// returns `OcrError::RateLimited`.
pub async fn retry_on_rate_limit<F, Fut>(
    backend_type: OcrBackendType,
    make_request: F,
) -> Result<Response, OcrError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, OcrError>>,
{
    let mut attempt = 0;
    loop {
        let response = make_request().await?;

        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let retry_after_secs = retry_after.as_deref().and_then(|s| s.parse::<u64>().ok());

        if attempt >= MAX_RETRIES {
            return Err(OcrError::RateLimited {
                backend: backend_type,
                retry_after_secs,
            });
        }

        let wait = parse_retry_after(retry_after.as_deref())
            .unwrap_or_else(|| backoff_delay(attempt, 1000));

        warn!(
            "{} rate limited (attempt {}), waiting {:?}",
            backend_type,
            attempt + 1,
            wait
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

/// Turn a non-success response into an `OcrFailed` error carrying the body.
pub async fn ensure_success(backend_name: &str, response: Response) -> Result<Response, OcrError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(OcrError::OcrFailed(format!(
        "{} API error ({}): {}",
        backend_name, status, body
    )))
}
