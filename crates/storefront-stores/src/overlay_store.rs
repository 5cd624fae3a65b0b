//! OverlayStore in-memory implementation.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use storefront_core::overlay::{OverlayRecord, OverlayStore, StoreError};

/// In-memory implementation for development and testing.
pub struct InMemoryOverlayStore {
    records: RwLock<HashMap<Option<String>, OverlayRecord>>,
}

impl InMemoryOverlayStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store seeded with records, later duplicates winning.
    pub fn with_records(records: impl IntoIterator<Item = OverlayRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.parent_id.clone(), record))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }
}

impl Default for InMemoryOverlayStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OverlayStore for InMemoryOverlayStore {
    async fn load_all(&self) -> Result<Vec<OverlayRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let mut all: Vec<OverlayRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| a.parent_id.cmp(&b.parent_id));
        Ok(all)
    }

    async fn save(
        &self,
        parent_id: Option<&str>,
        ordered_ids: &[String],
        hidden_ids: &BTreeSet<String>,
    ) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let parent_id = parent_id.map(str::to_string);
        records.insert(
            parent_id.clone(),
            OverlayRecord::new(parent_id, ordered_ids.to_vec(), hidden_ids.clone()),
        );
        Ok(())
    }

    async fn load(&self, parent_id: Option<&str>) -> Result<Option<OverlayRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(records.get(&parent_id.map(str::to_string)).cloned())
    }
}
