//! Batch file upload and text extraction for the open question.
//!
//! Files in a batch are dispatched concurrently and their outcomes merged
//! order-insensitively. One bad file never blocks the others; there is no
//! automatic retry - the user re-selects the file to try again.

use attest_core::backend::{IntakeBackend, UploadRequest};
use attest_core::error::AttestError;
use attest_core::session::{OpenQuestion, UploadedFile};
use std::sync::Arc;

/// One file picked by the user for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentSource {
    pub file_name: String,
    /// Explicit mime type; `None` lets the client guess from the name.
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

/// A single file that could not be ingested.
#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub file_name: String,
    pub error: AttestError,
}

/// Merged outcome of one upload batch.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Successfully uploaded and processed files.
    pub uploaded: Vec<UploadedFile>,
    /// Extracted text snippets, available for explicit insertion into the
    /// draft answer.
    pub extracted: Vec<String>,
    /// Per-file failures, surfaced without aborting the batch.
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn fully_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Uploads batches of files for the currently open question.
pub struct AttachmentIngestor {
    backend: Arc<dyn IntakeBackend>,
}

impl AttachmentIngestor {
    pub fn new(backend: Arc<dyn IntakeBackend>) -> Self {
        Self { backend }
    }

    /// Uploads every file in `sources` for the open question, each tagged
    /// with the session id and the question's section and data point.
    ///
    /// Per-file outcomes are independent: successes land in
    /// `IngestReport::uploaded` (plus any extracted text in the side
    /// list), failures in `IngestReport::failures`.
    pub async fn ingest_batch(
        &self,
        session_id: &str,
        open: &OpenQuestion,
        sources: Vec<AttachmentSource>,
    ) -> IngestReport {
        let uploads = sources.into_iter().map(|source| {
            let backend = self.backend.clone();
            let request = UploadRequest {
                session_id: session_id.to_string(),
                section: open.section.clone(),
                data_point: open.data_point.clone(),
                file_name: source.file_name.clone(),
                mime_type: source.mime_type,
                data: source.data,
            };
            async move { (source.file_name, backend.upload_attachment(request).await) }
        });

        let mut report = IngestReport::default();
        for (file_name, result) in futures::future::join_all(uploads).await {
            match result {
                Ok(file) => {
                    if let Some(content) = &file.extracted_content {
                        if !content.trim().is_empty() {
                            report.extracted.push(content.clone());
                        }
                    }
                    report.uploaded.push(file);
                }
                Err(error) => {
                    tracing::warn!(
                        "[AttachmentIngestor] Upload failed for {}: {}",
                        file_name,
                        error
                    );
                    report.failures.push(IngestFailure { file_name, error });
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use attest_core::backend::{AdvanceRequest, EnhanceRequest};
    use attest_core::error::Result;
    use attest_core::protocol::{AnswerEnhancement, ReportStatus, StepOutcome};

    /// Upload stub that fails any file whose name starts with "bad".
    struct FlakyUploadBackend;

    #[async_trait]
    impl IntakeBackend for FlakyUploadBackend {
        async fn advance_step(&self, _request: AdvanceRequest) -> Result<StepOutcome> {
            unreachable!("not used in ingestor tests")
        }

        async fn upload_attachment(&self, request: UploadRequest) -> Result<UploadedFile> {
            if request.file_name.starts_with("bad") {
                return Err(AttestError::api(Some(422), "Unsupported file", false));
            }
            Ok(UploadedFile {
                filename: format!("srv-{}", request.file_name),
                original_name: request.file_name,
                mimetype: request
                    .mime_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                size: request.data.len() as u64,
                extracted_content: Some("extracted text".to_string()),
                analysis: None,
            })
        }

        async fn enhance_answer(&self, _request: EnhanceRequest) -> Result<AnswerEnhancement> {
            unreachable!("not used in ingestor tests")
        }

        async fn report_status(&self, _product_id: &str) -> Result<ReportStatus> {
            unreachable!("not used in ingestor tests")
        }

        async fn submit_intake_form(&self, _product_id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn open_question() -> OpenQuestion {
        OpenQuestion {
            question: "Do you hold a certificate?".to_string(),
            section: "Certification History".to_string(),
            data_point: "certificate".to_string(),
        }
    }

    fn source(name: &str) -> AttachmentSource {
        AttachmentSource {
            file_name: name.to_string(),
            mime_type: Some("application/pdf".to_string()),
            data: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn one_bad_file_does_not_block_the_batch() {
        let ingestor = AttachmentIngestor::new(Arc::new(FlakyUploadBackend));

        let report = ingestor
            .ingest_batch(
                "session-1",
                &open_question(),
                vec![source("cert.pdf"), source("bad.exe"), source("audit.pdf")],
            )
            .await;

        assert_eq!(report.uploaded.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file_name, "bad.exe");
        assert!(!report.fully_succeeded());

        let names: Vec<_> = report
            .uploaded
            .iter()
            .map(|f| f.original_name.as_str())
            .collect();
        assert!(names.contains(&"cert.pdf"));
        assert!(names.contains(&"audit.pdf"));
    }

    #[tokio::test]
    async fn extracted_content_lands_on_the_side_list() {
        let ingestor = AttachmentIngestor::new(Arc::new(FlakyUploadBackend));

        let report = ingestor
            .ingest_batch("session-1", &open_question(), vec![source("cert.pdf")])
            .await;

        assert_eq!(report.extracted, ["extracted text"]);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let ingestor = AttachmentIngestor::new(Arc::new(FlakyUploadBackend));

        let report = ingestor
            .ingest_batch("session-1", &open_question(), Vec::new())
            .await;

        assert!(report.uploaded.is_empty());
        assert!(report.failures.is_empty());
        assert!(report.fully_succeeded());
    }
}
