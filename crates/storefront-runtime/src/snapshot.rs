//! Atomically swappable catalog snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;

use storefront_core::catalog::Catalog;

/// Holder of the current catalog. Readers get a whole snapshot, never a
/// half-built one; a rebuild replaces it in one swap.
pub struct CatalogHandle {
    current: ArcSwap<Catalog>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: ArcSwap::from_pointee(catalog),
        }
    }

    pub fn load(&self) -> Arc<Catalog> {
        self.current.load_full()
    }

    /// Install a new snapshot and return the previous one.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        self.current.swap(Arc::new(catalog))
    }
}

impl Default for CatalogHandle {
    fn default() -> Self {
        Self::new(Catalog::empty())
    }
}
