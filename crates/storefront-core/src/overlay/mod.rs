//! Order/visibility overlay
//!
//! An [`OverlayRecord`] overrides the child order of one parent and hides some
//! of its children. Absence of a record means natural order with nothing
//! hidden. Records are persisted through an injected [`OverlayStore`].

mod merge;
mod store;

pub use merge::{merge, merge_tagged, MergedEntry};
pub use store::{OverlayStore, StoreError};

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-parent override of child order and visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRecord {
    /// `None` is the root scope.
    pub parent_id: Option<String>,
    #[serde(default)]
    pub ordered_ids: Vec<String>,
    #[serde(default)]
    pub hidden_ids: BTreeSet<String>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl OverlayRecord {
    pub fn new(
        parent_id: Option<String>,
        ordered_ids: Vec<String>,
        hidden_ids: BTreeSet<String>,
    ) -> Self {
        Self {
            parent_id,
            ordered_ids,
            hidden_ids,
            updated_at: Utc::now(),
        }
    }

    /// Empty record for a scope that was never customized.
    pub fn natural(parent_id: Option<String>) -> Self {
        Self::new(parent_id, Vec::new(), BTreeSet::new())
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden_ids.contains(id)
    }

    /// Copy with `ordered_ids` replaced, hidden set kept.
    pub fn with_order(&self, ordered_ids: Vec<String>) -> Self {
        Self::new(self.parent_id.clone(), ordered_ids, self.hidden_ids.clone())
    }

    /// Copy with `id` flipped in the hidden set, order kept.
    pub fn with_toggled(&self, id: &str) -> Self {
        let mut hidden_ids = self.hidden_ids.clone();
        if !hidden_ids.remove(id) {
            hidden_ids.insert(id.to_string());
        }
        Self::new(self.parent_id.clone(), self.ordered_ids.clone(), hidden_ids)
    }
}

/// In-process copy of every overlay record, keyed by parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayMap {
    records: HashMap<Option<String>, OverlayRecord>,
}

impl OverlayMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later records for the same parent replace earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = OverlayRecord>) -> Self {
        let mut map = Self::new();
        for record in records {
            map.insert(record);
        }
        map
    }

    pub fn get(&self, parent_id: Option<&str>) -> Option<&OverlayRecord> {
        self.records.get(&parent_id.map(str::to_string))
    }

    /// Upsert by `parent_id`, returning the replaced record.
    pub fn insert(&mut self, record: OverlayRecord) -> Option<OverlayRecord> {
        self.records.insert(record.parent_id.clone(), record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverlayRecord> {
        self.records.values()
    }
}
