//! # Storefront Stores
//!
//! Overlay store implementations for storefront menus.
//!
//! This crate provides:
//! - InMemory OverlayStore
//! - JSON file OverlayStore

mod json_file;
mod overlay_store;

pub use json_file::JsonFileOverlayStore;
pub use overlay_store::InMemoryOverlayStore;

// Re-export core traits for convenience
pub use storefront_core::overlay::{OverlayRecord, OverlayStore, StoreError};
