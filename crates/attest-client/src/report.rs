//! Report status polling and intake completion notification.

use attest_core::error::{AttestError, Result};
use attest_core::protocol::{GeneratedReport, ReportStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::IntakeApiClient;

const REPORT_STATUS_PATH: &str = "/api/intake/report-status";
const SUBMIT_INTAKE_FORM_PATH: &str = "/api/intake/submit-intake-form";

const DEFAULT_PENDING_MESSAGE: &str = "Generating report...";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportStatusResponse {
    ready: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    report: Option<GeneratedReport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitIntakeFormRequest {
    product_id: String,
}

impl IntakeApiClient {
    pub(crate) async fn fetch_report_status(&self, product_id: &str) -> Result<ReportStatus> {
        let path = format!("{}/{}", REPORT_STATUS_PATH, product_id);
        let response: ReportStatusResponse = self.get_json(&path).await?;
        into_status(response)
    }

    pub(crate) async fn send_submit_intake_form(&self, product_id: &str) -> Result<()> {
        let body = SubmitIntakeFormRequest {
            product_id: product_id.to_string(),
        };
        // The acknowledgment body carries nothing the client uses.
        let _: Value = self.post_json(SUBMIT_INTAKE_FORM_PATH, &body).await?;
        Ok(())
    }
}

fn into_status(response: ReportStatusResponse) -> Result<ReportStatus> {
    if response.ready {
        let report = response.report.ok_or_else(|| {
            AttestError::api(None, "Backend reported ready without a report body", false)
        })?;
        return Ok(ReportStatus::Ready { report });
    }

    Ok(ReportStatus::Pending {
        message: response
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PENDING_MESSAGE.to_string()),
    })
}
