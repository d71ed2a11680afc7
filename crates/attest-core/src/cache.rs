//! Durable cache seam for completed intakes.
//!
//! A completed report and answer set are cached per product under the
//! fixed keys `summaryReport` / `summaryAnswers`, so a reload can resume
//! straight to the result screen without re-querying the server. The
//! cache is cleared only on explicit restart.

use crate::error::Result;
use crate::protocol::GeneratedReport;
use crate::session::ConversationEntry;
use async_trait::async_trait;

/// Fixed storage key for the cached report artifact.
pub const SUMMARY_REPORT_KEY: &str = "summaryReport";
/// Fixed storage key for the cached answer set.
pub const SUMMARY_ANSWERS_KEY: &str = "summaryAnswers";

/// Persistence seam for completed-intake artifacts, keyed by product id.
#[async_trait]
pub trait SummaryCacheRepository: Send + Sync {
    /// Loads the cached report for a product, if any.
    async fn load_report(&self, product_id: &str) -> Result<Option<GeneratedReport>>;

    /// Stores the report for a product, overwriting any previous one.
    async fn save_report(&self, product_id: &str, report: &GeneratedReport) -> Result<()>;

    /// Loads the cached answer set for a product, if any.
    async fn load_answers(&self, product_id: &str) -> Result<Option<Vec<ConversationEntry>>>;

    /// Stores the answer set for a product.
    async fn save_answers(&self, product_id: &str, entries: &[ConversationEntry]) -> Result<()>;

    /// Removes both cached artifacts for a product. Missing artifacts are
    /// not an error.
    async fn clear(&self, product_id: &str) -> Result<()>;
}
