//! Advisory answer-enhancement endpoint.

use attest_core::backend::EnhanceRequest;
use attest_core::error::Result;
use attest_core::protocol::AnswerEnhancement;
use attest_core::session::ProductContext;
use serde::Serialize;

use crate::http::IntakeApiClient;

const ENHANCE_ANSWER_PATH: &str = "/api/intake/enhance-answer";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnhanceAnswerRequest {
    question: String,
    answer: String,
    context: ProductContext,
}

impl IntakeApiClient {
    pub(crate) async fn send_enhance_answer(
        &self,
        request: EnhanceRequest,
    ) -> Result<AnswerEnhancement> {
        let body = EnhanceAnswerRequest {
            question: request.question,
            answer: request.answer,
            context: request.product,
        };

        // The response body is the enhancement itself.
        self.post_json(ENHANCE_ANSWER_PATH, &body).await
    }
}
