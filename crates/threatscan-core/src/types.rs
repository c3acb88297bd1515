//! Core types for ThreatScan

use serde::{Deserialize, Serialize};

/// Label returned for blank input
pub const EMPTY_LABEL: &str = "empty";

/// A single ranked classification outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Human-readable threat label
    pub label: String,

    /// Probability in `[0, 1]`
    pub score: f32,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }

    /// Sentinel prediction returned for empty or whitespace-only text
    pub fn empty() -> Self {
        Self::new(EMPTY_LABEL, 1.0)
    }
}
