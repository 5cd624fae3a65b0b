//! Live overlay map in front of the overlay store.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use storefront_core::overlay::{OverlayMap, OverlayRecord, OverlayStore, StoreError};

/// Overlays as seen by renderers, plus the store they persist to.
///
/// Readers share one immutable map; a write installs a copy with the new
/// record. Writes land in the live map first; a failed save is logged and the
/// in-memory change stays.
pub struct OverlayRegistry {
    live: ArcSwap<OverlayMap>,
    write_lock: Mutex<()>,
    store: Arc<dyn OverlayStore>,
}

impl OverlayRegistry {
    pub fn new(store: Arc<dyn OverlayStore>) -> Self {
        Self {
            live: ArcSwap::from_pointee(OverlayMap::new()),
            write_lock: Mutex::new(()),
            store,
        }
    }

    /// Replace the live map with everything the store holds.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let records = self.store.load_all().await?;
        let map = OverlayMap::from_records(records);
        let count = map.len();
        self.live.store(Arc::new(map));
        info!(overlays = count, "overlays loaded");
        Ok(count)
    }

    /// Current overlays; unaffected by later writes.
    pub fn snapshot(&self) -> Arc<OverlayMap> {
        self.live.load_full()
    }

    pub fn get(&self, parent_id: Option<&str>) -> Option<OverlayRecord> {
        self.live.load().get(parent_id).cloned()
    }

    /// Install `record` and persist it. Returns whether the save succeeded.
    pub async fn apply(&self, record: OverlayRecord) -> bool {
        let _guard = self.write_lock.lock().await;
        let mut next = (**self.live.load()).clone();
        next.insert(record.clone());
        self.live.store(Arc::new(next));

        match self
            .store
            .save(
                record.parent_id.as_deref(),
                &record.ordered_ids,
                &record.hidden_ids,
            )
            .await
        {
            Ok(()) => {
                debug!(
                    parent_id = ?record.parent_id,
                    ordered = record.ordered_ids.len(),
                    hidden = record.hidden_ids.len(),
                    "overlay persisted"
                );
                true
            }
            Err(err) => {
                warn!(
                    parent_id = ?record.parent_id,
                    error = %err,
                    "overlay save failed; keeping in-memory change"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use storefront_stores::InMemoryOverlayStore;

    struct FailingStore;

    #[async_trait]
    impl OverlayStore for FailingStore {
        async fn load_all(&self) -> Result<Vec<OverlayRecord>, StoreError> {
            Err(StoreError::Io("disk gone".to_string()))
        }

        async fn save(
            &self,
            _parent_id: Option<&str>,
            _ordered_ids: &[String],
            _hidden_ids: &BTreeSet<String>,
        ) -> Result<(), StoreError> {
            Err(StoreError::Io("disk gone".to_string()))
        }
    }

    fn record(parent: Option<&str>, ids: &[&str]) -> OverlayRecord {
        OverlayRecord::new(
            parent.map(str::to_string),
            ids.iter().map(|id| id.to_string()).collect(),
            BTreeSet::new(),
        )
    }

    #[test]
    fn test_apply_persists_and_updates_live_map() {
        tokio_test::block_on(async {
            let store = Arc::new(InMemoryOverlayStore::new());
            let registry = OverlayRegistry::new(store.clone());
            assert!(registry.apply(record(None, &["b", "a"])).await);

            let live = registry.get(None).unwrap();
            assert_eq!(live.ordered_ids, vec!["b", "a"]);
            let saved = store.load(None).await.unwrap().unwrap();
            assert_eq!(saved.ordered_ids, vec!["b", "a"]);
        });
    }

    #[test]
    fn test_failed_save_keeps_in_memory_change() {
        tokio_test::block_on(async {
            let registry = OverlayRegistry::new(Arc::new(FailingStore));
            assert!(registry.load().await.is_err());
            assert!(!registry.apply(record(Some("soups"), &["s2", "s1"])).await);
            let live = registry.get(Some("soups")).unwrap();
            assert_eq!(live.ordered_ids, vec!["s2", "s1"]);
        });
    }

    #[test]
    fn test_load_replaces_live_map() {
        tokio_test::block_on(async {
            let store = Arc::new(InMemoryOverlayStore::with_records(vec![
                record(None, &["x"]),
                record(Some("x"), &["y"]),
            ]));
            let registry = OverlayRegistry::new(store);
            assert_eq!(registry.load().await.unwrap(), 2);
            assert_eq!(registry.snapshot().len(), 2);
        });
    }

    #[test]
    fn test_snapshot_is_shared_until_a_write() {
        tokio_test::block_on(async {
            let registry = OverlayRegistry::new(Arc::new(InMemoryOverlayStore::new()));
            let before = registry.snapshot();
            assert!(Arc::ptr_eq(&before, &registry.snapshot()));

            registry.apply(record(None, &["b", "a"])).await;
            assert!(before.is_empty());
            let after = registry.snapshot();
            assert!(!Arc::ptr_eq(&before, &after));
            assert_eq!(after.len(), 1);
        });
    }
}
