//! Advisory answer enhancement.
//!
//! Purely advisory: a failure here is logged and degrades to "no
//! suggestions available", never to a session-blocking error.

use attest_core::backend::{EnhanceRequest, IntakeBackend};
use attest_core::protocol::AnswerEnhancement;
use attest_core::session::ProductContext;
use std::sync::Arc;

pub struct AnswerEnhancer {
    backend: Arc<dyn IntakeBackend>,
}

impl AnswerEnhancer {
    pub fn new(backend: Arc<dyn IntakeBackend>) -> Self {
        Self { backend }
    }

    /// Requests advisory feedback for a draft answer.
    ///
    /// Returns `None` for an empty draft (no call is made) and on any
    /// backend failure.
    pub async fn enhance(
        &self,
        question: &str,
        answer: &str,
        product: &ProductContext,
    ) -> Option<AnswerEnhancement> {
        if answer.trim().is_empty() {
            return None;
        }

        let request = EnhanceRequest {
            question: question.to_string(),
            answer: answer.to_string(),
            product: product.clone(),
        };

        match self.backend.enhance_answer(request).await {
            Ok(enhancement) => Some(enhancement),
            Err(e) => {
                tracing::warn!("[AnswerEnhancer] Enhancement unavailable: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use attest_core::backend::{AdvanceRequest, UploadRequest};
    use attest_core::error::{AttestError, Result};
    use attest_core::protocol::{ReportStatus, StepOutcome};
    use attest_core::session::UploadedFile;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EnhanceBackend {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IntakeBackend for EnhanceBackend {
        async fn advance_step(&self, _request: AdvanceRequest) -> Result<StepOutcome> {
            unreachable!("not used in enhancer tests")
        }

        async fn upload_attachment(&self, _request: UploadRequest) -> Result<UploadedFile> {
            unreachable!("not used in enhancer tests")
        }

        async fn enhance_answer(&self, _request: EnhanceRequest) -> Result<AnswerEnhancement> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AttestError::transport("advisory service down"));
            }
            Ok(AnswerEnhancement {
                is_complete: false,
                suggestions: vec!["name the certifying body".to_string()],
                missing_info: Vec::new(),
                concerns: Vec::new(),
                enhanced_answer: Some("A fuller answer.".to_string()),
            })
        }

        async fn report_status(&self, _product_id: &str) -> Result<ReportStatus> {
            unreachable!("not used in enhancer tests")
        }

        async fn submit_intake_form(&self, _product_id: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failure_degrades_to_none() {
        let enhancer = AnswerEnhancer::new(Arc::new(EnhanceBackend {
            fail: true,
            calls: AtomicUsize::new(0),
        }));

        let result = enhancer
            .enhance("Q?", "my answer", &ProductContext::for_product("prod-1"))
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn empty_answer_never_calls_the_backend() {
        let backend = Arc::new(EnhanceBackend {
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let enhancer = AnswerEnhancer::new(backend.clone());

        assert!(
            enhancer
                .enhance("Q?", "   ", &ProductContext::for_product("prod-1"))
                .await
                .is_none()
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_returns_the_enhancement() {
        let enhancer = AnswerEnhancer::new(Arc::new(EnhanceBackend {
            fail: false,
            calls: AtomicUsize::new(0),
        }));

        let enhancement = enhancer
            .enhance("Q?", "my answer", &ProductContext::for_product("prod-1"))
            .await
            .unwrap();
        assert_eq!(enhancement.enhanced_answer.as_deref(), Some("A fuller answer."));
    }
}
