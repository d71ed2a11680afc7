//! Orchestration of the guided intake session.
//!
//! `IntakeUseCase` owns the session state machine and the answer draft,
//! and drives them through the backend seam: start, submit, restart,
//! resume-from-cache, and the completion side effects (answer caching,
//! the fire-and-forget intake-form notification, and report polling).

use attest_core::backend::{AdvanceRequest, IntakeBackend};
use attest_core::cache::SummaryCacheRepository;
use attest_core::error::{AttestError, Result};
use attest_core::protocol::{AnswerEnhancement, StepOutcome};
use attest_core::session::{AnswerDraft, IntakeSession, ProductContext, Screen};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};

use crate::answer_enhancer::AnswerEnhancer;
use crate::attachment_ingestor::{AttachmentIngestor, AttachmentSource, IngestReport};
use crate::report_poller::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollState, ReportPoller,
};

/// Releases the submission slot when a step-advancement call finishes,
/// on every exit path.
struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Controller for one intake session.
///
/// All mutable flow state lives behind this one object; rendering and
/// protocol code work on snapshots. Network effects go through the
/// injected [`IntakeBackend`]; durable artifacts through the injected
/// [`SummaryCacheRepository`].
pub struct IntakeUseCase {
    backend: Arc<dyn IntakeBackend>,
    cache: Arc<dyn SummaryCacheRepository>,
    ingestor: AttachmentIngestor,
    enhancer: AnswerEnhancer,
    session: RwLock<IntakeSession>,
    draft: RwLock<AnswerDraft>,
    /// Busy flag: no two step-advancement calls in flight per session.
    submitting: AtomicBool,
    poller: Mutex<Option<Arc<ReportPoller>>>,
    poll_interval: Duration,
    poll_max_attempts: u32,
}

impl IntakeUseCase {
    /// Creates a use case for a fresh session on the given product.
    pub fn new(
        backend: Arc<dyn IntakeBackend>,
        cache: Arc<dyn SummaryCacheRepository>,
        product: ProductContext,
    ) -> Self {
        Self {
            ingestor: AttachmentIngestor::new(backend.clone()),
            enhancer: AnswerEnhancer::new(backend.clone()),
            backend,
            cache,
            session: RwLock::new(IntakeSession::new(product)),
            draft: RwLock::new(AnswerDraft::new()),
            submitting: AtomicBool::new(false),
            poller: Mutex::new(None),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides the polling cadence for subsequently started pollers.
    pub fn with_poll_settings(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.poll_max_attempts = max_attempts;
        self
    }

    /// A snapshot of the current session state for rendering.
    pub async fn session(&self) -> IntakeSession {
        self.session.read().await.clone()
    }

    /// A snapshot of the current answer draft for rendering.
    pub async fn draft(&self) -> AnswerDraft {
        self.draft.read().await.clone()
    }

    /// Records the category choice on the category-select screen.
    pub async fn select_category(
        &self,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> Result<()> {
        self.session
            .write()
            .await
            .select_category(category, subcategory)
    }

    /// Attempts the cache-hit fast path: when a completed report is found
    /// in the durable cache, the session is rebuilt directly on the
    /// result screen and `true` is returned. Unreadable cache entries are
    /// treated as absent.
    pub async fn resume(&self) -> bool {
        let product_id = self.product_id().await;

        let report = match self.cache.load_report(&product_id).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("[IntakeUseCase] Ignoring unreadable report cache: {}", e);
                None
            }
        };
        let Some(report) = report else {
            return false;
        };

        let answers = match self.cache.load_answers(&product_id).await {
            Ok(answers) => answers.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("[IntakeUseCase] Ignoring unreadable answer cache: {}", e);
                Vec::new()
            }
        };

        tracing::info!(
            "[IntakeUseCase] Resuming completed intake for {} from cache",
            product_id
        );
        let product = self.session.read().await.product().clone();
        *self.session.write().await = IntakeSession::resume_completed(product, answers, report);
        true
    }

    /// Starts the conversational loop: validates the category choice,
    /// transitions the screen, and fetches the first question.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when category or subcategory is
    /// missing (no network call is made), `Busy` when an advance call is
    /// already in flight, or the advance failure itself. After a failed
    /// first fetch the session stays on the conversational screen and
    /// `start` may be called again to retry.
    pub async fn start(&self) -> Result<StepOutcome> {
        {
            let mut session = self.session.write().await;
            match session.screen() {
                Screen::CategorySelect => session.begin()?,
                // A failed first fetch left us here without a question;
                // allow the retry without a second transition.
                Screen::Conversational
                    if session.open_question().is_none() && session.log().is_empty() => {}
                _ => return Err(AttestError::validation("Intake has already started")),
            }
        }

        let request = self.build_advance_request(String::new(), Vec::new()).await;
        let _slot = self.acquire_submission_slot()?;
        let outcome = self.backend.advance_step(request).await?;

        self.session
            .write()
            .await
            .apply_outcome(String::new(), Vec::new(), outcome.clone())?;

        if outcome.is_complete() {
            self.on_complete().await;
        }
        Ok(outcome)
    }

    /// Replaces the draft answer text.
    pub async fn set_answer_text(&self, text: impl Into<String>) {
        self.draft.write().await.set_text(text);
    }

    /// Appends the extracted snippet at `index` to the draft text
    /// (the explicit insertion action).
    pub async fn insert_extracted(&self, index: usize) -> Result<()> {
        self.draft.write().await.insert_extracted(index)
    }

    /// Uploads a batch of files for the open question and records the
    /// successful ones against the draft.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when no question is open. Per-file
    /// upload failures are reported inside the `IngestReport`, never as
    /// an error of the batch.
    pub async fn attach_files(&self, sources: Vec<AttachmentSource>) -> Result<IngestReport> {
        let (session_id, open) = {
            let session = self.session.read().await;
            let open = session.open_question().cloned().ok_or_else(|| {
                AttestError::validation("No question is awaiting an answer")
            })?;
            (session.id().to_string(), open)
        };

        let report = self.ingestor.ingest_batch(&session_id, &open, sources).await;

        let mut draft = self.draft.write().await;
        for file in &report.uploaded {
            draft.record_upload(file.clone());
        }
        Ok(report)
    }

    /// Requests advisory feedback for the current draft and stores it on
    /// the draft. Returns `None` when no question is open, the draft is
    /// empty, or the advisory call fails.
    pub async fn request_enhancement(&self) -> Option<AnswerEnhancement> {
        let (question, answer, product) = {
            let session = self.session.read().await;
            let open = session.open_question()?;
            let draft = self.draft.read().await;
            (
                open.question.clone(),
                draft.text().to_string(),
                session.product().clone(),
            )
        };

        let enhancement = self.enhancer.enhance(&question, &answer, &product).await?;
        self.draft
            .write()
            .await
            .set_enhancement(enhancement.clone());
        Some(enhancement)
    }

    /// Applies the pending enhancement to the draft (one-shot).
    pub async fn apply_enhancement(&self) -> Result<()> {
        self.draft.write().await.apply_enhancement()
    }

    /// Discards the pending enhancement.
    pub async fn dismiss_enhancement(&self) {
        self.draft.write().await.dismiss_enhancement();
    }

    /// Submits the draft answer for the open question.
    ///
    /// On success the answered entry is appended to the log and the draft
    /// resets; on completion the side effects fire (answer caching, the
    /// intake-form notification, one polling sequence). On failure the
    /// log, the open question, and the draft are all preserved, so the
    /// user may resubmit the same answer.
    ///
    /// # Errors
    ///
    /// `Validation` when nothing is open to answer or the draft is empty
    /// (no network call is made), `Busy` when an advance call is already
    /// in flight, otherwise the advance failure.
    pub async fn submit_answer(&self) -> Result<StepOutcome> {
        let (answer, attachments) = {
            let session = self.session.read().await;
            if session.screen() != Screen::Conversational || session.open_question().is_none() {
                return Err(AttestError::validation("No question is awaiting an answer"));
            }
            let draft = self.draft.read().await;
            if draft.is_empty() {
                return Err(AttestError::validation(
                    "Please provide an answer or attach a document",
                ));
            }
            (draft.text().to_string(), draft.attachments().to_vec())
        };

        let request = self
            .build_advance_request(answer.clone(), attachments.clone())
            .await;

        let _slot = self.acquire_submission_slot()?;
        let outcome = self.backend.advance_step(request).await?;

        self.draft.write().await.take();
        self.session
            .write()
            .await
            .apply_outcome(answer, attachments, outcome.clone())?;

        if outcome.is_complete() {
            self.on_complete().await;
        }
        Ok(outcome)
    }

    /// The current polling state, `Idle` before completion.
    pub async fn poll_state(&self) -> PollState {
        match self.poller.lock().await.as_ref() {
            Some(poller) => poller.state(),
            None => PollState::Idle,
        }
    }

    /// Subscribes to polling state updates, once polling has started.
    pub async fn subscribe_poll(&self) -> Option<watch::Receiver<PollState>> {
        self.poller.lock().await.as_ref().map(|p| p.subscribe())
    }

    /// Waits for the running polling sequence to reach a terminal state.
    /// On `Ready` the report is stored on the session and in the durable
    /// cache.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when polling has not started.
    pub async fn await_report(&self) -> Result<PollState> {
        let poller = self
            .poller
            .lock()
            .await
            .clone()
            .ok_or_else(|| AttestError::validation("Report polling has not started"))?;

        let state = poller.wait().await;
        if let PollState::Ready(report) = &state {
            self.session.write().await.set_report(report.clone())?;
            let product_id = self.product_id().await;
            if let Err(e) = self.cache.save_report(&product_id, report).await {
                tracing::warn!("[IntakeUseCase] Failed to cache report: {}", e);
            }
        }
        Ok(state)
    }

    /// Restarts the session: cancels any live poller, clears the durable
    /// cache, and replaces the session wholesale with a fresh one on the
    /// category-select screen. The only permitted state reset.
    pub async fn restart(&self) {
        tracing::info!("[IntakeUseCase] Restarting intake session");

        if let Some(poller) = self.poller.lock().await.take() {
            poller.cancel();
        }

        let product_id = self.product_id().await;
        if let Err(e) = self.cache.clear(&product_id).await {
            tracing::warn!("[IntakeUseCase] Failed to clear cache: {}", e);
        }

        let mut session = self.session.write().await;
        let mut product = session.product().clone();
        product.category.clear();
        product.subcategory.clear();
        *session = IntakeSession::new(product);
        drop(session);

        *self.draft.write().await = AnswerDraft::new();
    }

    async fn product_id(&self) -> String {
        self.session.read().await.product().product_id.clone()
    }

    async fn build_advance_request(
        &self,
        answer: String,
        attachments: Vec<attest_core::session::UploadedFile>,
    ) -> AdvanceRequest {
        let session = self.session.read().await;
        AdvanceRequest {
            session_id: session.id().to_string(),
            step_index: session.step_index(),
            conversation_log: session.log().to_vec(),
            answer,
            attachments,
            product: session.product().clone(),
        }
    }

    fn acquire_submission_slot(&self) -> Result<SubmissionGuard<'_>> {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AttestError::Busy);
        }
        Ok(SubmissionGuard {
            flag: &self.submitting,
        })
    }

    /// Completion side effects: cache the answer set, notify the platform
    /// (fire-and-forget), and start exactly one polling sequence.
    async fn on_complete(&self) {
        let (product_id, log) = {
            let session = self.session.read().await;
            (
                session.product().product_id.clone(),
                session.log().to_vec(),
            )
        };

        if let Err(e) = self.cache.save_answers(&product_id, &log).await {
            tracing::warn!("[IntakeUseCase] Failed to cache answers: {}", e);
        }

        // Best-effort notification; its failure must not block the user
        // from seeing the completed questionnaire.
        let backend = self.backend.clone();
        let notify_id = product_id.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.submit_intake_form(&notify_id).await {
                tracing::warn!("[IntakeUseCase] Intake-form notification failed: {}", e);
            }
        });

        let mut slot = self.poller.lock().await;
        if slot.is_some() {
            tracing::warn!("[IntakeUseCase] Report polling already started, ignoring");
            return;
        }
        let poller = Arc::new(
            ReportPoller::new(self.backend.clone())
                .with_interval(self.poll_interval)
                .with_max_attempts(self.poll_max_attempts),
        );
        poller.start(&product_id);
        *slot = Some(poller);
    }
}
