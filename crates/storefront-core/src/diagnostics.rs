//! Build diagnostics
//!
//! Nothing here is fatal. Collisions, orphans and dropped records are counted
//! and the catalog stays usable.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::record::{
    as_number, as_text, has_folder_hint, RawRecord, HIERARCHY_FIELDS, ID_FIELDS,
    PARENT_HIERARCHY_FIELDS, PRICE_FIELDS, TYPE_FIELDS,
};
use crate::segment::{has_separator, SegmentSource};

const MAX_FIELD_NAMES: usize = 30;
const MAX_TYPE_STRINGS: usize = 20;

/// Two or more node ids that normalized to the same folder path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCollision {
    pub path: String,
    /// Colliding ids; the first one owns the path.
    pub ids: Vec<String>,
}

/// Shape statistics over the raw record list, before any build step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStats {
    pub total: usize,
    pub with_id: usize,
    pub without_id: usize,
    pub with_price: usize,
    pub without_price: usize,
    pub hierarchy_with_separator: usize,
    pub hierarchy_without_separator: usize,
    pub hierarchy_missing: usize,
    pub parent_token_present: usize,
    pub folder_hints: usize,
    /// Observed raw field names, sorted.
    pub field_names: Vec<String>,
    /// Observed type strings, sorted.
    pub type_strings: Vec<String>,
}

impl RawStats {
    pub fn collect(records: &[RawRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        let mut field_names = BTreeSet::new();
        let mut type_strings = BTreeSet::new();

        for record in records {
            field_names.extend(record.keys().cloned());

            if ID_FIELDS.lookup(record).and_then(as_text).is_some() {
                stats.with_id += 1;
            } else {
                stats.without_id += 1;
            }
            if PRICE_FIELDS.lookup(record).and_then(as_number).is_some() {
                stats.with_price += 1;
            } else {
                stats.without_price += 1;
            }
            match HIERARCHY_FIELDS.lookup(record).and_then(as_text) {
                Some(token) if has_separator(&token) => stats.hierarchy_with_separator += 1,
                Some(_) => stats.hierarchy_without_separator += 1,
                None => stats.hierarchy_missing += 1,
            }
            if PARENT_HIERARCHY_FIELDS.lookup(record).and_then(as_text).is_some() {
                stats.parent_token_present += 1;
            }
            if has_folder_hint(record) {
                stats.folder_hints += 1;
            }
            if let Some(kind) = TYPE_FIELDS.lookup(record).and_then(as_text) {
                type_strings.insert(kind);
            }
        }

        stats.field_names = field_names.into_iter().take(MAX_FIELD_NAMES).collect();
        stats.type_strings = type_strings.into_iter().take(MAX_TYPE_STRINGS).collect();
        stats
    }
}

/// Outcome of one catalog build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub total_records: usize,
    pub folders: usize,
    pub items: usize,
    pub dropped_folders: usize,
    pub dropped_items: usize,
    pub duplicate_ids: Vec<String>,
    pub path_collisions: Vec<PathCollision>,
    /// Nodes with a multi-segment path that still ended up at root.
    pub orphans: Vec<String>,
    /// Nodes whose resolved parent would have closed a cycle.
    pub broken_cycles: Vec<String>,
    pub segment_length: Option<usize>,
    pub segment_source: SegmentSource,
    pub raw_stats: RawStats,
}

impl Default for BuildReport {
    fn default() -> Self {
        Self {
            total_records: 0,
            folders: 0,
            items: 0,
            dropped_folders: 0,
            dropped_items: 0,
            duplicate_ids: Vec::new(),
            path_collisions: Vec::new(),
            orphans: Vec::new(),
            broken_cycles: Vec::new(),
            segment_length: None,
            segment_source: SegmentSource::Unsegmented,
            raw_stats: RawStats::default(),
        }
    }
}

impl BuildReport {
    pub fn has_warnings(&self) -> bool {
        !self.duplicate_ids.is_empty()
            || !self.path_collisions.is_empty()
            || !self.orphans.is_empty()
            || !self.broken_cycles.is_empty()
            || self.dropped_folders > 0
            || self.dropped_items > 0
    }
}

/// Human-readable outline of the root folders of a catalog.
///
/// Lists up to `max_folders` root folders in base order, each with its child
/// counts and up to `max_items` sample item names.
pub fn tree_preview(catalog: &Catalog, max_folders: usize, max_items: usize) -> String {
    let mut out = String::new();
    let roots = catalog.folders(None);
    let _ = writeln!(
        out,
        "root: {} folders, {} items",
        roots.len(),
        catalog.items(None).len()
    );
    for id in roots.iter().take(max_folders) {
        let Some(node) = catalog.node(id) else {
            continue;
        };
        let scope = Some(id.as_str());
        let _ = writeln!(
            out,
            "- {} [{}] folders={} items={}",
            node.name,
            node.id,
            catalog.folders(scope).len(),
            catalog.items(scope).len()
        );
        for item_id in catalog.items(scope).iter().take(max_items) {
            if let Some(item) = catalog.node(item_id) {
                let _ = writeln!(out, "    * {}", item.name);
            }
        }
    }
    if roots.len() > max_folders {
        let _ = writeln!(out, "... {} more", roots.len() - max_folders);
    }
    out
}
