//! # Storefront Runtime
//!
//! Wires the catalog core to its surroundings:
//! - Catalog sources with bounded fetch retry
//! - An atomically swapped catalog snapshot, rebuilt on refresh
//! - Live overlays in front of an overlay store
//! - Per-conversation navigation state and per-actor sort sessions
//! - Bootstrap from `storefront.yaml`, including tracing setup

pub mod bootstrap;
pub mod engine;
pub mod overlays;
pub mod session;
pub mod snapshot;
pub mod source;

pub use bootstrap::{
    bootstrap, bootstrap_from_path, build_catalog_source, build_overlay_store,
    init_tracing_if_needed, BootstrapError,
};
pub use engine::{EngineError, EngineOptions, EngineResponse, MenuEngine};
pub use overlays::OverlayRegistry;
pub use session::{ActorId, ConversationId, SessionRegistry};
pub use snapshot::CatalogHandle;
pub use source::{
    fetch_with_retry, CatalogSource, JsonFileCatalogSource, RetryPolicy, SourceError,
    StaticCatalogSource,
};
