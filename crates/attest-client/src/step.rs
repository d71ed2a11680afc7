//! Step-advancement endpoint.

use attest_core::backend::AdvanceRequest;
use attest_core::error::{AttestError, Result};
use attest_core::protocol::StepOutcome;
use attest_core::session::{ConversationEntry, ProductContext, Progress, UploadedFile};
use serde::{Deserialize, Serialize};

use crate::http::IntakeApiClient;

const ADVANCE_STEP_PATH: &str = "/api/intake/advance-step";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdvanceStepRequest {
    session_id: String,
    step_index: usize,
    conversation_log: Vec<ConversationEntry>,
    answer: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<UploadedFile>,
    product_context: ProductContext,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdvanceStepResponse {
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    next_question: Option<String>,
    #[serde(default)]
    progress: Option<ProgressBody>,
    #[serde(default)]
    current_section: Option<String>,
    #[serde(default)]
    current_data_point: Option<String>,
}

#[derive(Deserialize)]
struct ProgressBody {
    #[serde(default)]
    overall: u8,
    #[serde(default)]
    section: u8,
}

impl IntakeApiClient {
    pub(crate) async fn send_advance_step(&self, request: AdvanceRequest) -> Result<StepOutcome> {
        tracing::debug!(
            "[IntakeApiClient] Advancing step {} for session {}",
            request.step_index,
            request.session_id
        );

        let body = AdvanceStepRequest {
            session_id: request.session_id,
            step_index: request.step_index,
            conversation_log: request.conversation_log,
            answer: request.answer,
            attachments: request.attachments,
            product_context: request.product,
        };

        let response: AdvanceStepResponse = self.post_json(ADVANCE_STEP_PATH, &body).await?;
        into_outcome(response)
    }
}

fn into_outcome(response: AdvanceStepResponse) -> Result<StepOutcome> {
    if response.is_complete {
        return Ok(StepOutcome::Complete);
    }

    let question = response.next_question.filter(|q| !q.trim().is_empty()).ok_or_else(|| {
        AttestError::api(
            None,
            "Backend returned neither a next question nor a completion signal",
            false,
        )
    })?;

    let (overall, section) = response
        .progress
        .map(|p| (p.overall, p.section))
        .unwrap_or((0, 0));

    Ok(StepOutcome::Next {
        question,
        progress: Progress {
            overall,
            section,
            current_section: response.current_section.unwrap_or_default(),
            current_data_point: response.current_data_point.unwrap_or_default(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_step_response_maps_to_outcome() {
        let raw = r#"{
            "isComplete": false,
            "nextQuestion": "Since when are you certified?",
            "progress": {"overall": 10, "section": 25},
            "currentSection": "Certification History",
            "currentDataPoint": "certification_date"
        }"#;
        let response: AdvanceStepResponse = serde_json::from_str(raw).unwrap();

        match into_outcome(response).unwrap() {
            StepOutcome::Next { question, progress } => {
                assert_eq!(question, "Since when are you certified?");
                assert_eq!(progress.overall, 10);
                assert_eq!(progress.section, 25);
                assert_eq!(progress.current_section, "Certification History");
            }
            StepOutcome::Complete => panic!("expected next step"),
        }
    }

    #[test]
    fn completion_wins_over_other_fields() {
        let raw = r#"{"isComplete": true, "nextQuestion": "ignored"}"#;
        let response: AdvanceStepResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(into_outcome(response).unwrap(), StepOutcome::Complete);
    }

    #[test]
    fn missing_question_is_a_protocol_error() {
        let raw = r#"{"isComplete": false}"#;
        let response: AdvanceStepResponse = serde_json::from_str(raw).unwrap();
        assert!(into_outcome(response).is_err());
    }
}
