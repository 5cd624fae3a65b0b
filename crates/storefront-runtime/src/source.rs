//! Catalog sources and bounded fetch retry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use storefront_config::SourceConfig;
use storefront_core::record::{extract_records, RawRecord};

/// Catalog source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Supplier of raw catalog records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn fetch_records(&self) -> Result<Vec<RawRecord>, SourceError>;
}

/// Fixed record list held in memory.
pub struct StaticCatalogSource {
    records: Vec<RawRecord>,
}

impl StaticCatalogSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    /// Accepts a bare record array or an API response envelope.
    pub fn from_value(value: Value) -> Self {
        Self::new(extract_records(value))
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_records(&self) -> Result<Vec<RawRecord>, SourceError> {
        Ok(self.records.clone())
    }
}

/// Catalog API response dump on disk.
pub struct JsonFileCatalogSource {
    path: PathBuf,
}

impl JsonFileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for JsonFileCatalogSource {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn fetch_records(&self) -> Result<Vec<RawRecord>, SourceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            SourceError::Io(format!("{}: {}", self.path.display(), e))
        })?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            SourceError::Parse(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(extract_records(value))
    }
}

/// Exponential backoff for catalog fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(5_000),
        }
    }
}

impl From<&SourceConfig> for RetryPolicy {
    fn from(config: &SourceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt after `retries_used` failures.
    pub fn backoff(&self, retries_used: u32) -> Duration {
        let base_ms = self.base_delay.as_millis();
        if base_ms == 0 {
            return Duration::from_millis(0);
        }
        let max_ms = self.max_delay.as_millis().max(base_ms);
        let shift = retries_used.min(20);
        let multiplier = 1u128 << shift;
        let backoff_ms = base_ms.saturating_mul(multiplier).min(max_ms);
        let millis = u64::try_from(backoff_ms).unwrap_or(u64::MAX);
        Duration::from_millis(millis)
    }
}

/// Fetch records, retrying failures with backoff. Returns the last error once
/// attempts run out.
pub async fn fetch_with_retry(
    source: &dyn CatalogSource,
    policy: &RetryPolicy,
) -> Result<Vec<RawRecord>, SourceError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut retries_used = 0u32;
    loop {
        match source.fetch_records().await {
            Ok(records) => {
                tracing::info!(
                    source = source.name(),
                    records = records.len(),
                    attempt = retries_used + 1,
                    "catalog records fetched"
                );
                return Ok(records);
            }
            Err(err) if retries_used + 1 < max_attempts => {
                let delay = policy.backoff(retries_used);
                tracing::warn!(
                    source = source.name(),
                    attempt = retries_used + 1,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "catalog fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                retries_used += 1;
            }
            Err(err) => {
                tracing::error!(
                    source = source.name(),
                    attempts = max_attempts,
                    error = %err,
                    "catalog fetch failed"
                );
                return Err(err);
            }
        }
    }
}
