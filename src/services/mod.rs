//! Service layer for scanlens.
//!
//! Orchestrates the scorer and the recognition backends, separated from
//! CLI concerns so other front ends can reuse it.

pub mod assessment;

pub use assessment::{assess_readability, check_blur, compare, Comparison, MethodOutcome};
