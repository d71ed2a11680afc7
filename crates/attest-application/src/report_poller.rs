//! Bounded, cancellable polling for the asynchronously generated report.
//!
//! Modeled as an explicit repeating task with an attempt counter and a
//! cancellation token tied to the session lifecycle, not as an
//! uncontrolled recursive timer. Observers subscribe to a watch channel;
//! a cancelled poller never publishes state again.

use attest_core::backend::IntakeBackend;
use attest_core::protocol::{GeneratedReport, ReportStatus};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Fixed wait between poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Bounded attempt count (~60 seconds ceiling at the default interval).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Observable state of one polling sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// Polling has not started.
    Idle,
    /// An attempt came back not-ready; `message` is the server-provided
    /// status line.
    Waiting { attempt: u32, message: String },
    /// The report arrived.
    Ready(GeneratedReport),
    /// All attempts exhausted without readiness. Soft timeout: the
    /// session is intact and a later visit may poll again from scratch.
    TimedOut,
    /// A poll attempt failed in transit. Polling stopped immediately;
    /// distinct from the soft timeout.
    Failed(String),
}

impl PollState {
    /// Check if the polling sequence has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::TimedOut | Self::Failed(_))
    }
}

/// One polling sequence against the report-status endpoint.
///
/// `start` spawns the poll task; `cancel` stops it at the next await
/// point. A poller polls at most once - a completed or cancelled poller
/// is not restarted, a fresh one is built instead.
pub struct ReportPoller {
    backend: Arc<dyn IntakeBackend>,
    interval: Duration,
    max_attempts: u32,
    state_tx: watch::Sender<PollState>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReportPoller {
    pub fn new(backend: Arc<dyn IntakeBackend>) -> Self {
        let (state_tx, _) = watch::channel(PollState::Idle);
        Self {
            backend,
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            state_tx,
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// Overrides the wait between attempts.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Overrides the bounded attempt count.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Subscribes to state updates.
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state_tx.subscribe()
    }

    /// The current state.
    pub fn state(&self) -> PollState {
        self.state_tx.borrow().clone()
    }

    /// Spawns the poll task for `product_id`.
    ///
    /// Returns false without spawning when this poller was already
    /// started - each completion signal triggers exactly one sequence.
    pub fn start(&self, product_id: &str) -> bool {
        let mut handle = self.handle.lock().expect("poller handle lock poisoned");
        if handle.is_some() {
            tracing::warn!("[ReportPoller] Already started, ignoring");
            return false;
        }

        tracing::info!("[ReportPoller] Polling report status for {}", product_id);

        let backend = self.backend.clone();
        let state_tx = self.state_tx.clone();
        let cancel = self.cancel.clone();
        let interval = self.interval;
        let max_attempts = self.max_attempts;
        let product_id = product_id.to_string();

        *handle = Some(tokio::spawn(async move {
            for attempt in 1..=max_attempts {
                let status = tokio::select! {
                    _ = cancel.cancelled() => return,
                    status = backend.report_status(&product_id) => status,
                };
                // No state updates after cancellation.
                if cancel.is_cancelled() {
                    return;
                }

                match status {
                    Ok(ReportStatus::Ready { report }) => {
                        tracing::info!(
                            "[ReportPoller] Report ready after {} attempt(s)",
                            attempt
                        );
                        state_tx.send_replace(PollState::Ready(report));
                        return;
                    }
                    Ok(ReportStatus::Pending { message }) => {
                        tracing::debug!(
                            "[ReportPoller] Attempt {}/{}: {}",
                            attempt,
                            max_attempts,
                            message
                        );
                        state_tx.send_replace(PollState::Waiting { attempt, message });
                    }
                    Err(e) => {
                        // Fail fast: no retry on transport or API errors.
                        tracing::warn!("[ReportPoller] Poll attempt failed: {}", e);
                        state_tx.send_replace(PollState::Failed(e.to_string()));
                        return;
                    }
                }

                if attempt < max_attempts {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
            }

            if !cancel.is_cancelled() {
                tracing::info!(
                    "[ReportPoller] No report after {} attempts, giving up the live wait",
                    max_attempts
                );
                state_tx.send_replace(PollState::TimedOut);
            }
        }));
        true
    }

    /// Stops the poll task at its next await point. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits until the sequence reaches a terminal state and returns it.
    ///
    /// Returns the last observed state if the poller is cancelled while
    /// waiting.
    pub async fn wait(&self) -> PollState {
        let mut rx = self.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if current.is_terminal() {
                return current;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return self.state(),
                changed = rx.changed() => {
                    if changed.is_err() {
                        return self.state();
                    }
                }
            }
        }
    }
}

impl Drop for ReportPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use attest_core::backend::{AdvanceRequest, EnhanceRequest, UploadRequest};
    use attest_core::error::{AttestError, Result};
    use attest_core::protocol::{AnswerEnhancement, StepOutcome};
    use attest_core::session::UploadedFile;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn report() -> GeneratedReport {
        GeneratedReport {
            summary: "Compliant".to_string(),
            fir_report: "Full report body".to_string(),
            product_name: "Organic Wheat".to_string(),
            company_name: "Greenfield Co".to_string(),
            category: "agriculture".to_string(),
        }
    }

    /// Backend stub that serves a scripted sequence of status results;
    /// once the script runs dry it keeps answering "pending".
    struct ScriptedStatusBackend {
        statuses: std::sync::Mutex<VecDeque<Result<ReportStatus>>>,
        calls: AtomicUsize,
    }

    impl ScriptedStatusBackend {
        fn new(statuses: Vec<Result<ReportStatus>>) -> Self {
            Self {
                statuses: std::sync::Mutex::new(statuses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IntakeBackend for ScriptedStatusBackend {
        async fn advance_step(&self, _request: AdvanceRequest) -> Result<StepOutcome> {
            unreachable!("not used in poller tests")
        }

        async fn upload_attachment(&self, _request: UploadRequest) -> Result<UploadedFile> {
            unreachable!("not used in poller tests")
        }

        async fn enhance_answer(&self, _request: EnhanceRequest) -> Result<AnswerEnhancement> {
            unreachable!("not used in poller tests")
        }

        async fn report_status(&self, _product_id: &str) -> Result<ReportStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.statuses.lock().unwrap().pop_front().unwrap_or_else(|| {
                Ok(ReportStatus::Pending {
                    message: "Generating report...".to_string(),
                })
            })
        }

        async fn submit_intake_form(&self, _product_id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn pending(message: &str) -> Result<ReportStatus> {
        Ok(ReportStatus::Pending {
            message: message.to_string(),
        })
    }

    #[tokio::test]
    async fn report_ready_on_third_attempt() {
        let backend = Arc::new(ScriptedStatusBackend::new(vec![
            pending("Generating report..."),
            pending("Almost there"),
            Ok(ReportStatus::Ready { report: report() }),
        ]));
        let poller = ReportPoller::new(backend.clone()).with_interval(Duration::from_millis(1));

        assert!(poller.start("prod-1"));
        let state = poller.wait().await;

        assert_eq!(state, PollState::Ready(report()));
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn never_ready_stops_after_exactly_max_attempts() {
        let backend = Arc::new(ScriptedStatusBackend::new(Vec::new()));
        let poller = ReportPoller::new(backend.clone())
            .with_interval(Duration::from_millis(1))
            .with_max_attempts(30);

        poller.start("prod-1");
        let state = poller.wait().await;

        assert_eq!(state, PollState::TimedOut);
        assert_eq!(backend.calls(), 30);
    }

    #[tokio::test]
    async fn transport_error_fails_fast() {
        let backend = Arc::new(ScriptedStatusBackend::new(vec![
            pending("Generating report..."),
            Err(AttestError::transport("connection reset")),
        ]));
        let poller = ReportPoller::new(backend.clone()).with_interval(Duration::from_millis(1));

        poller.start("prod-1");
        let state = poller.wait().await;

        assert!(matches!(state, PollState::Failed(_)));
        assert_ne!(state, PollState::TimedOut);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn cancelled_poller_stops_updating_state() {
        let backend = Arc::new(ScriptedStatusBackend::new(Vec::new()));
        let poller = ReportPoller::new(backend.clone()).with_interval(Duration::from_millis(20));

        poller.start("prod-1");
        let mut rx = poller.subscribe();
        // Wait for the first not-ready update, then cancel mid-interval.
        rx.changed().await.unwrap();
        poller.cancel();

        let calls_at_cancel = backend.calls();
        let state_at_cancel = poller.state();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(backend.calls(), calls_at_cancel);
        assert_eq!(poller.state(), state_at_cancel);
    }

    #[tokio::test]
    async fn second_start_is_refused() {
        let backend = Arc::new(ScriptedStatusBackend::new(vec![Ok(ReportStatus::Ready {
            report: report(),
        })]));
        let poller = ReportPoller::new(backend.clone()).with_interval(Duration::from_millis(1));

        assert!(poller.start("prod-1"));
        assert!(!poller.start("prod-1"));

        poller.wait().await;
        assert_eq!(backend.calls(), 1);
    }
}
