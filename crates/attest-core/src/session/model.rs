//! Intake session domain model.
//!
//! This module contains the session state machine the orchestration layer
//! operates on. It is pure state: all network effects live in the
//! application layer behind the [`IntakeBackend`] seam.
//!
//! [`IntakeBackend`]: crate::backend::IntakeBackend

use crate::error::{AttestError, Result};
use crate::protocol::{GeneratedReport, StepOutcome};
use crate::session::{ConversationEntry, ProductContext, Progress, Screen, UploadedFile};
use serde::{Deserialize, Serialize};

/// The question currently awaiting an answer.
///
/// At most one question is open at any time; its section and data point
/// arrived with the step-advancement response that delivered it, and tag
/// both uploads made while composing and the log entry that closes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenQuestion {
    pub question: String,
    pub section: String,
    pub data_point: String,
}

/// One run of the guided intake flow for a single product.
///
/// Owns the screen state, the append-only conversation log, per-step
/// progress, and the received report. The session id is client-generated
/// and stable for the session's lifetime; a restart replaces the session
/// wholesale with a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeSession {
    id: String,
    product: ProductContext,
    screen: Screen,
    log: Vec<ConversationEntry>,
    progress: Progress,
    open_question: Option<OpenQuestion>,
    report: Option<GeneratedReport>,
    created_at: String,
}

impl IntakeSession {
    /// Creates a fresh session on the category-select screen.
    pub fn new(product: ProductContext) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            product,
            screen: Screen::CategorySelect,
            log: Vec::new(),
            progress: Progress::default(),
            open_question: None,
            report: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Cache-hit fast path: reconstructs a completed session directly on
    /// the result screen from durably cached answers and report,
    /// bypassing the conversational loop entirely.
    pub fn resume_completed(
        product: ProductContext,
        log: Vec<ConversationEntry>,
        report: GeneratedReport,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            product,
            screen: Screen::Result,
            log,
            progress: Progress::complete(),
            open_question: None,
            report: Some(report),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn product(&self) -> &ProductContext {
        &self.product
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The answered entries so far, in strict chronological order.
    pub fn log(&self) -> &[ConversationEntry] {
        &self.log
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn open_question(&self) -> Option<&OpenQuestion> {
        self.open_question.as_ref()
    }

    pub fn report(&self) -> Option<&GeneratedReport> {
        self.report.as_ref()
    }

    /// The zero-based index of the step the next advance call requests,
    /// sent as an explicit idempotency key: a resubmit after a failed
    /// call repeats the same index, while each successful advance moves
    /// it forward by one.
    pub fn step_index(&self) -> usize {
        self.log.len() + usize::from(self.open_question.is_some())
    }

    /// Records the category choice made on the category-select screen.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when the session has already left the
    /// category-select screen.
    pub fn select_category(
        &mut self,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> Result<()> {
        if self.screen != Screen::CategorySelect {
            return Err(AttestError::validation(
                "Category can only be chosen on the category-select screen",
            ));
        }
        self.product.category = category.into();
        self.product.subcategory = subcategory.into();
        Ok(())
    }

    /// Transitions `CategorySelect -> Conversational`.
    ///
    /// # Errors
    ///
    /// Refused with a `Validation` error - and no state change - when the
    /// category or subcategory is missing, or when the session is not on
    /// the category-select screen.
    pub fn begin(&mut self) -> Result<()> {
        if self.screen != Screen::CategorySelect {
            return Err(AttestError::validation("Intake has already started"));
        }
        self.product.validate_for_start()?;
        self.screen = Screen::Conversational;
        Ok(())
    }

    /// Applies a successful step-advancement outcome.
    ///
    /// If a question was open it is closed into the log together with the
    /// submitted answer and attachments (this is the only way entries are
    /// appended). On [`StepOutcome::Next`] the next question opens and
    /// progress is overwritten wholesale; on [`StepOutcome::Complete`]
    /// progress is forced to 100/100 and the screen becomes `Result`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error outside the conversational screen.
    pub fn apply_outcome(
        &mut self,
        answer: String,
        attachments: Vec<UploadedFile>,
        outcome: StepOutcome,
    ) -> Result<()> {
        if self.screen != Screen::Conversational {
            return Err(AttestError::validation(
                "No step advancement outside the conversational screen",
            ));
        }

        if let Some(open) = self.open_question.take() {
            self.log.push(ConversationEntry {
                question: open.question,
                answer,
                section: open.section,
                data_point: open.data_point,
                attachments,
            });
        }

        match outcome {
            StepOutcome::Next { question, progress } => {
                self.open_question = Some(OpenQuestion {
                    question,
                    section: progress.current_section.clone(),
                    data_point: progress.current_data_point.clone(),
                });
                self.progress = progress;
            }
            StepOutcome::Complete => {
                self.progress = Progress::complete();
                self.screen = Screen::Result;
            }
        }
        Ok(())
    }

    /// Stores the asynchronously generated report once polling succeeds.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error before the session reaches the result
    /// screen: polling may only begin after the completion signal.
    pub fn set_report(&mut self, report: GeneratedReport) -> Result<()> {
        if self.screen != Screen::Result {
            return Err(AttestError::validation(
                "A report can only be attached on the result screen",
            ));
        }
        self.report = Some(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductContext {
        ProductContext {
            product_id: "prod-7".to_string(),
            category: "agriculture".to_string(),
            subcategory: "Organic Farming".to_string(),
            company_name: "Greenfield Co".to_string(),
            location: "Lyon".to_string(),
            certifications: vec!["EU Organic".to_string()],
        }
    }

    fn next(question: &str, overall: u8, section: u8) -> StepOutcome {
        StepOutcome::Next {
            question: question.to_string(),
            progress: Progress {
                overall,
                section,
                current_section: "Certification History".to_string(),
                current_data_point: "certification_date".to_string(),
            },
        }
    }

    fn report() -> GeneratedReport {
        GeneratedReport {
            summary: "Compliant".to_string(),
            fir_report: "Full report body".to_string(),
            product_name: "Organic Wheat".to_string(),
            company_name: "Greenfield Co".to_string(),
            category: "agriculture".to_string(),
        }
    }

    #[test]
    fn begin_refused_without_category() {
        let mut session = IntakeSession::new(ProductContext::for_product("prod-7"));
        let err = session.begin().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.screen(), Screen::CategorySelect);
    }

    #[test]
    fn begin_moves_to_conversational() {
        let mut session = IntakeSession::new(product());
        session.begin().unwrap();
        assert_eq!(session.screen(), Screen::Conversational);

        // Only one start per session.
        assert!(session.begin().is_err());
    }

    #[test]
    fn select_category_only_before_start() {
        let mut session = IntakeSession::new(ProductContext::for_product("prod-7"));
        session.select_category("agriculture", "Organic Farming").unwrap();
        session.begin().unwrap();
        assert!(session.select_category("textiles", "Wool").is_err());
    }

    #[test]
    fn first_outcome_opens_question_without_logging() {
        let mut session = IntakeSession::new(product());
        session.begin().unwrap();

        session
            .apply_outcome(String::new(), Vec::new(), next("First question?", 10, 25))
            .unwrap();

        assert_eq!(session.log().len(), 0);
        assert_eq!(session.open_question().unwrap().question, "First question?");
        assert_eq!(session.progress().overall, 10);
    }

    #[test]
    fn log_grows_by_one_per_answered_step() {
        let mut session = IntakeSession::new(product());
        session.begin().unwrap();
        session
            .apply_outcome(String::new(), Vec::new(), next("Q1?", 10, 25))
            .unwrap();

        session
            .apply_outcome(
                "Certified organic since 2019".to_string(),
                Vec::new(),
                next("Q2?", 20, 50),
            )
            .unwrap();

        assert_eq!(session.log().len(), 1);
        assert_eq!(session.step_index(), 2);
        let entry = &session.log()[0];
        assert_eq!(entry.question, "Q1?");
        assert_eq!(entry.answer, "Certified organic since 2019");
        assert_eq!(entry.section, "Certification History");
        assert_eq!(session.open_question().unwrap().question, "Q2?");
    }

    #[test]
    fn completion_closes_last_entry_and_reaches_result() {
        let mut session = IntakeSession::new(product());
        session.begin().unwrap();
        session
            .apply_outcome(String::new(), Vec::new(), next("Q1?", 10, 25))
            .unwrap();

        session
            .apply_outcome("Final answer".to_string(), Vec::new(), StepOutcome::Complete)
            .unwrap();

        assert_eq!(session.screen(), Screen::Result);
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.progress().overall, 100);
        assert_eq!(session.progress().section, 100);
        assert!(session.open_question().is_none());
    }

    #[test]
    fn report_only_lands_on_result_screen() {
        let mut session = IntakeSession::new(product());
        assert!(session.set_report(report()).is_err());

        session.begin().unwrap();
        session
            .apply_outcome(String::new(), Vec::new(), StepOutcome::Complete)
            .unwrap();
        session.set_report(report()).unwrap();
        assert_eq!(session.report().unwrap().summary, "Compliant");
    }

    #[test]
    fn resume_completed_bypasses_the_loop() {
        let log = vec![ConversationEntry {
            question: "Q1?".to_string(),
            answer: "A1".to_string(),
            section: "S".to_string(),
            data_point: "d".to_string(),
            attachments: Vec::new(),
        }];

        let session = IntakeSession::resume_completed(product(), log, report());
        assert_eq!(session.screen(), Screen::Result);
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.progress().overall, 100);
        assert!(session.report().is_some());
    }

    #[test]
    fn fresh_sessions_get_distinct_ids() {
        let a = IntakeSession::new(product());
        let b = IntakeSession::new(product());
        assert_ne!(a.id(), b.id());
    }
}
