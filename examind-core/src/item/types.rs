//! Item type definitions

use serde::{Deserialize, Serialize};

/// A single calibrated exam item
///
/// Difficulty lives on the same fixed scale as the ability estimate
/// (0.0 to 10.0 by default). Content is opaque to the engine; it is
/// passed through to the client unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item identifier within the pool
    pub id: String,
    /// Calibrated difficulty on the ability scale
    pub difficulty: f64,
    /// Optional discrimination parameter (>= 0); defaults to 1.0 in scoring
    #[serde(default)]
    pub discrimination: Option<f64>,
    /// Opaque item content (question text, choices, media references)
    #[serde(default)]
    pub content: serde_json::Value,
}

impl Item {
    /// Create an item with the given id and difficulty and no content
    pub fn new(id: impl Into<String>, difficulty: f64) -> Self {
        Self {
            id: id.into(),
            difficulty,
            discrimination: None,
            content: serde_json::Value::Null,
        }
    }

    /// Builder-style discrimination setter
    pub fn with_discrimination(mut self, discrimination: f64) -> Self {
        self.discrimination = Some(discrimination);
        self
    }
}
