//! scanlens - document image readability scoring and OCR backend comparison.
//!
//! Scores scanned or photographed documents for fitness for text extraction
//! and routes them through interchangeable OCR backends.

pub mod cli;
pub mod config;
pub mod ocr;
pub mod quality;
pub mod rate_limit;
pub mod services;
pub mod timing;
