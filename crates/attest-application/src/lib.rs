//! Application layer: orchestration of the guided intake flow.
//!
//! Ties the domain state machine from `attest-core` to a backend
//! implementation: session lifecycle ([`IntakeUseCase`]), batch uploads
//! ([`AttachmentIngestor`]), advisory enhancement ([`AnswerEnhancer`]),
//! and bounded report polling ([`ReportPoller`]).

mod answer_enhancer;
mod attachment_ingestor;
mod intake_usecase;
mod report_poller;

pub use answer_enhancer::AnswerEnhancer;
pub use attachment_ingestor::{
    AttachmentIngestor, AttachmentSource, IngestFailure, IngestReport,
};
pub use intake_usecase::IntakeUseCase;
pub use report_poller::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollState, ReportPoller,
};
