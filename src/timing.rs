//! Processing-time records for each method run against an image.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// How long one processing method took.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTimeRecord {
    pub method: String,
    pub duration_ms: f64,
    #[serde(rename = "timestampISO8601")]
    pub timestamp: DateTime<Utc>,
}

/// Append-only log of processing times, kept in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ProcessingLog {
    records: Vec<ProcessingTimeRecord>,
}

impl ProcessingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record stamped with the current time.
    pub fn record(&mut self, method: impl Into<String>, duration_ms: f64) -> &ProcessingTimeRecord {
        self.records.push(ProcessingTimeRecord {
            method: method.into(),
            duration_ms,
            timestamp: Utc::now(),
        });
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[ProcessingTimeRecord] {
        &self.records
    }

    pub fn total_ms(&self) -> f64 {
        self.records.iter().map(|r| r.duration_ms).sum()
    }
}
