//! Outcome of a single processed work item.

use serde::{Deserialize, Serialize};

/// Result of a work item, as published on the `outputs` queue.
///
/// Exactly one of `value` / `error` is meaningful: a failed item carries
/// `value: null` and an error description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub id: String,
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingResult {
    /// A successful result carrying the computed value.
    pub fn success(id: impl Into<String>, value: i64) -> Self {
        Self {
            id: id.into(),
            value: Some(value),
            error: None,
        }
    }

    /// A failed result carrying an error description.
    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
