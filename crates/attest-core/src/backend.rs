//! The seam between the intake flow and the backend reasoning service.
//!
//! The orchestration layer only sees this trait; the HTTP implementation
//! lives in `attest-client`, and tests substitute mocks.

use crate::error::Result;
use crate::protocol::{AnswerEnhancement, ReportStatus, StepOutcome};
use crate::session::{ConversationEntry, ProductContext, UploadedFile};
use async_trait::async_trait;

/// One step-advancement request: the full conversation log so far plus
/// the new answer. `step_index` is the zero-based index of the requested
/// step and serves as the idempotency key for duplicate submissions.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceRequest {
    pub session_id: String,
    pub step_index: usize,
    pub conversation_log: Vec<ConversationEntry>,
    pub answer: String,
    pub attachments: Vec<UploadedFile>,
    pub product: ProductContext,
}

/// One file destined for the extraction endpoint, tagged with the
/// session and the question it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub session_id: String,
    pub section: String,
    pub data_point: String,
    pub file_name: String,
    /// Explicit mime type; when `None` the client guesses from the name.
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

/// An advisory enhancement request for a draft answer.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceRequest {
    pub question: String,
    pub answer: String,
    pub product: ProductContext,
}

/// Backend contract consumed by the intake flow.
///
/// Idempotency and duplicate-submission behavior of `advance_step` is
/// owned by the server; the client supplies `step_index` so the server
/// can dedupe deterministically.
#[async_trait]
pub trait IntakeBackend: Send + Sync {
    /// Turns the conversation log plus the new answer into either the
    /// next question or the completion signal.
    async fn advance_step(&self, request: AdvanceRequest) -> Result<StepOutcome>;

    /// Uploads a single file for text extraction. Per-file, independent
    /// outcome: a failure here never concerns other files of a batch.
    async fn upload_attachment(&self, request: UploadRequest) -> Result<UploadedFile>;

    /// Requests advisory feedback on a draft answer. No side effects.
    async fn enhance_answer(&self, request: EnhanceRequest) -> Result<AnswerEnhancement>;

    /// Polls the report generation status for a product.
    async fn report_status(&self, product_id: &str) -> Result<ReportStatus>;

    /// Notifies the platform that the intake form was completed.
    /// Best-effort; invoked once on completion.
    async fn submit_intake_form(&self, product_id: &str) -> Result<()>;
}
