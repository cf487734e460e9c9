use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One weight report received from the scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reading {
    /// Wall-clock time at which the chunk was received, not when it was sent.
    pub timestamp: DateTime<Local>,
    /// Trimmed text exactly as received, never blank.
    #[serde(rename = "Message")]
    pub raw_message: String,
    /// `None` when no number could be found in `raw_message`.
    pub weight: Option<f64>,
    #[serde(rename = "WeightUnit")]
    pub unit: String,
}
