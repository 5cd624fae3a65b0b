//! # Storefront Core
//!
//! Deterministic catalog logic for chat storefront menus.
//!
//! This crate contains:
//! - Raw record normalization through explicit field fallback chains
//! - Hierarchy segmentation and catalog tree reconstruction
//! - Order/visibility overlays and their merge rule
//! - Paginated navigation rendering with auto-descend
//! - The admin sort state machine
//!
//! This crate does NOT care about:
//! - Where records come from
//! - How overlays are persisted
//! - How render descriptors are displayed

pub mod admin;
pub mod catalog;
pub mod diagnostics;
pub mod overlay;
pub mod record;
pub mod render;
pub mod segment;
pub mod token;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::admin::{MoveDirection, SortEntry, SortError, SortSession, SortState, SortView};
    pub use crate::catalog::{Catalog, CatalogBuilder, CatalogNode};
    pub use crate::diagnostics::{BuildReport, PathCollision, RawStats};
    pub use crate::overlay::{
        merge, merge_tagged, MergedEntry, OverlayMap, OverlayRecord, OverlayStore, StoreError,
    };
    pub use crate::record::{extract_records, normalize, NormalizedRecord, RawRecord};
    pub use crate::render::{
        FolderLink, ItemLink, NavigationState, Navigator, PageLink, RenderDescriptor,
        RenderNotice, RenderOptions, RowGroup, SummaryRow,
    };
    pub use crate::segment::{SegmentSource, Segmentation};
    pub use crate::token::{ActionToken, TokenError};
}

// Re-export key types at crate root
pub use admin::{MoveDirection, SortError, SortSession, SortView};
pub use catalog::{Catalog, CatalogBuilder, CatalogNode};
pub use diagnostics::BuildReport;
pub use overlay::{OverlayMap, OverlayRecord, OverlayStore, StoreError};
pub use record::RawRecord;
pub use render::{FolderLink, NavigationState, Navigator, RenderDescriptor, RenderOptions};
pub use token::{ActionToken, TokenError};
