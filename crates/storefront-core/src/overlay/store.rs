//! Overlay persistence boundary.
//!
//! Implementations live in the storefront-stores crate.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use super::OverlayRecord;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Overlay store trait - async interface for overlay persistence
#[async_trait]
pub trait OverlayStore: Send + Sync {
    /// Every persisted record.
    async fn load_all(&self) -> Result<Vec<OverlayRecord>, StoreError>;

    /// Full-replace upsert keyed by `parent_id`. `None` is the root scope.
    async fn save(
        &self,
        parent_id: Option<&str>,
        ordered_ids: &[String],
        hidden_ids: &BTreeSet<String>,
    ) -> Result<(), StoreError>;

    /// Record of a single parent.
    async fn load(&self, parent_id: Option<&str>) -> Result<Option<OverlayRecord>, StoreError> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .find(|record| record.parent_id.as_deref() == parent_id))
    }
}
