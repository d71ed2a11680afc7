//! JSON-file implementation of the summary cache.
//!
//! Artifacts live under `<data_dir>/attest/<product_id>/` as
//! `summaryReport.json` and `summaryAnswers.json`, matching the fixed
//! storage key pair of the intake contract. Cleared only on explicit
//! restart.

use attest_core::cache::{SUMMARY_ANSWERS_KEY, SUMMARY_REPORT_KEY, SummaryCacheRepository};
use attest_core::error::{AttestError, Result};
use attest_core::protocol::GeneratedReport;
use attest_core::session::ConversationEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-backed [`SummaryCacheRepository`], one directory per product.
pub struct JsonDirSummaryCache {
    base_dir: PathBuf,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredReport {
    cached_at: String,
    report: GeneratedReport,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAnswers {
    cached_at: String,
    answers: Vec<ConversationEntry>,
}

impl JsonDirSummaryCache {
    /// Creates a cache rooted at the platform data directory
    /// (`<data_dir>/attest`).
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error when the platform data directory cannot
    /// be determined.
    pub fn new() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| AttestError::storage("Could not determine data directory"))?;
        Ok(Self {
            base_dir: data_dir.join("attest"),
        })
    }

    /// Creates a cache rooted at an explicit directory. Used by tests and
    /// embedded deployments.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn product_dir(&self, product_id: &str) -> Result<PathBuf> {
        if product_id.trim().is_empty()
            || product_id.contains('/')
            || product_id.contains('\\')
            || product_id.contains("..")
        {
            return Err(AttestError::storage(format!(
                "Invalid product id for cache path: {:?}",
                product_id
            )));
        }
        Ok(self.base_dir.join(product_id))
    }

    async fn read_artifact<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                let parsed = serde_json::from_str(&content).map_err(|e| {
                    AttestError::Serialization {
                        format: "JSON".to_string(),
                        message: format!("Corrupt cache file {}: {}", path.display(), e),
                    }
                })?;
                Ok(Some(parsed))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AttestError::storage(format!(
                "Failed to read cache file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn write_artifact<T: Serialize>(&self, dir: &Path, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(dir).await.map_err(|e| {
            AttestError::storage(format!(
                "Failed to create cache directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let path = dir.join(format!("{key}.json"));
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&path, content).await.map_err(|e| {
            AttestError::storage(format!(
                "Failed to write cache file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl SummaryCacheRepository for JsonDirSummaryCache {
    async fn load_report(&self, product_id: &str) -> Result<Option<GeneratedReport>> {
        let path = self
            .product_dir(product_id)?
            .join(format!("{SUMMARY_REPORT_KEY}.json"));
        let stored: Option<StoredReport> = self.read_artifact(&path).await?;
        Ok(stored.map(|s| s.report))
    }

    async fn save_report(&self, product_id: &str, report: &GeneratedReport) -> Result<()> {
        let dir = self.product_dir(product_id)?;
        let stored = StoredReport {
            cached_at: chrono::Utc::now().to_rfc3339(),
            report: report.clone(),
        };
        self.write_artifact(&dir, SUMMARY_REPORT_KEY, &stored).await
    }

    async fn load_answers(&self, product_id: &str) -> Result<Option<Vec<ConversationEntry>>> {
        let path = self
            .product_dir(product_id)?
            .join(format!("{SUMMARY_ANSWERS_KEY}.json"));
        let stored: Option<StoredAnswers> = self.read_artifact(&path).await?;
        Ok(stored.map(|s| s.answers))
    }

    async fn save_answers(&self, product_id: &str, entries: &[ConversationEntry]) -> Result<()> {
        let dir = self.product_dir(product_id)?;
        let stored = StoredAnswers {
            cached_at: chrono::Utc::now().to_rfc3339(),
            answers: entries.to_vec(),
        };
        self.write_artifact(&dir, SUMMARY_ANSWERS_KEY, &stored).await
    }

    async fn clear(&self, product_id: &str) -> Result<()> {
        let dir = self.product_dir(product_id)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!("[JsonDirSummaryCache] Cleared cache for {}", product_id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AttestError::storage(format!(
                "Failed to clear cache directory {}: {}",
                dir.display(),
                e
            ))),
        }
    }
}
