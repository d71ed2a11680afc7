//! Attachment upload / text extraction endpoint.

use attest_core::backend::UploadRequest;
use attest_core::error::Result;
use attest_core::session::UploadedFile;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::http::IntakeApiClient;

const UPLOAD_ATTACHMENT_PATH: &str = "/api/intake/upload-attachment";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadAttachmentRequest {
    session_id: String,
    section: String,
    data_point: String,
    file_name: String,
    mime_type: String,
    /// Base64-encoded file bytes.
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadAttachmentResponse {
    file: FileMeta,
    #[serde(default)]
    extracted_content: Option<String>,
    #[serde(default)]
    analysis: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMeta {
    filename: String,
    original_name: String,
    mimetype: String,
    size: u64,
}

impl IntakeApiClient {
    pub(crate) async fn send_upload_attachment(
        &self,
        request: UploadRequest,
    ) -> Result<UploadedFile> {
        let mime_type = request.mime_type.unwrap_or_else(|| {
            mime_guess::from_path(&request.file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

        tracing::debug!(
            "[IntakeApiClient] Uploading {} ({}, {} bytes) for session {}",
            request.file_name,
            mime_type,
            request.data.len(),
            request.session_id
        );

        let body = UploadAttachmentRequest {
            session_id: request.session_id,
            section: request.section,
            data_point: request.data_point,
            file_name: request.file_name,
            mime_type,
            data: BASE64_STANDARD.encode(&request.data),
        };

        let response: UploadAttachmentResponse =
            self.post_json(UPLOAD_ATTACHMENT_PATH, &body).await?;

        Ok(UploadedFile {
            filename: response.file.filename,
            original_name: response.file.original_name,
            mimetype: response.file.mimetype,
            size: response.file.size,
            extracted_content: response.extracted_content,
            analysis: response.analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_merges_extraction_into_file() {
        let raw = r#"{
            "file": {
                "filename": "a1b2.pdf",
                "originalName": "certificate.pdf",
                "mimetype": "application/pdf",
                "size": 2048
            },
            "extractedContent": "Organic certificate issued 2019"
        }"#;
        let response: UploadAttachmentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.file.original_name, "certificate.pdf");
        assert_eq!(
            response.extracted_content.as_deref(),
            Some("Organic certificate issued 2019")
        );
        assert!(response.analysis.is_none());
    }
}
