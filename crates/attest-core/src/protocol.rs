//! Protocol types exchanged with the intake backend.
//!
//! These model the three response shapes the client cares about: the
//! step-advancement outcome, the advisory answer enhancement, and the
//! polled report status.

use crate::session::Progress;
use serde::{Deserialize, Serialize};

/// The generated compliance report, computed asynchronously after intake
/// completion. Immutable after receipt; cached per product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedReport {
    pub summary: String,
    pub fir_report: String,
    pub product_name: String,
    pub company_name: String,
    pub category: String,
}

/// Advisory feedback on a draft answer.
///
/// Ephemeral: recomputed on demand and discarded on submission or
/// dismissal. Never persisted in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEnhancement {
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub missing_info: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    /// A rewritten answer the user may apply wholesale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_answer: Option<String>,
}

/// Result of one step-advancement exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The backend produced the next question; progress is overwritten
    /// with the values it reported.
    Next { question: String, progress: Progress },
    /// The intake is complete. The session moves to the result screen
    /// and report polling may begin.
    Complete,
}

impl StepOutcome {
    /// Check if this outcome is the terminal completion signal
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Result of one report-status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    /// Report not ready yet; `message` is the server-provided
    /// human-readable status line to show while waiting.
    Pending { message: String },
    /// Report is ready.
    Ready { report: GeneratedReport },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enhancement_tolerates_sparse_payloads() {
        let enhancement: AnswerEnhancement = serde_json::from_str(r#"{"isComplete": true}"#).unwrap();
        assert!(enhancement.is_complete);
        assert!(enhancement.suggestions.is_empty());
        assert!(enhancement.enhanced_answer.is_none());
    }
}
