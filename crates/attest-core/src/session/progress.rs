//! Intake progress metrics.

use serde::{Deserialize, Serialize};

/// Progress through the intake, as reported by the backend.
///
/// Overwritten wholesale on every successful step-advancement response.
/// Monotonicity is a convention of the backend, not enforced here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Overall completion percentage (0-100).
    #[serde(default)]
    pub overall: u8,
    /// Completion percentage within the current section (0-100).
    #[serde(default)]
    pub section: u8,
    #[serde(default)]
    pub current_section: String,
    #[serde(default)]
    pub current_data_point: String,
}

impl Progress {
    /// Progress as forced on the completion signal: both bars full.
    pub fn complete() -> Self {
        Self {
            overall: 100,
            section: 100,
            current_section: String::new(),
            current_data_point: String::new(),
        }
    }
}
