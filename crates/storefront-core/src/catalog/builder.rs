//! Tree builder
//!
//! Folders are registered first under their raw hierarchy token and their
//! normalized path, then every node resolves its parent:
//! 1. an explicit parent token, looked up among raw folder tokens;
//! 2. the node's own path minus its last segment, looked up among folder paths.
//!
//! Items additionally try their exact path first, since some sources give an
//! item the path of the folder that holds it. Anything unresolved sits at root.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use super::sort::sort_children;
use super::{Catalog, CatalogNode, Children};
use crate::diagnostics::{BuildReport, PathCollision, RawStats};
use crate::record::{normalize, RawRecord};
use crate::segment::{parent_path, path_depth, Segmentation};

/// Id prefix of folders that carry a path but no id.
pub const SYNTHETIC_FOLDER_PREFIX: &str = "__cat__:";

const MAX_LOGGED_COLLISIONS: usize = 10;
const MAX_LOGGED_ORPHANS: usize = 15;

/// Builds [`Catalog`] snapshots from raw records.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    segment_length: Option<usize>,
}

struct Pending {
    id: String,
    parent_token: Option<String>,
}

#[derive(Default)]
struct FolderIndex {
    by_token: HashMap<String, String>,
    by_path: HashMap<String, String>,
    path_ids: BTreeMap<String, Vec<String>>,
}

impl FolderIndex {
    /// First registration of a token or a path wins.
    fn register(&mut self, id: &str, token: Option<&str>, path: Option<&str>) {
        if let Some(token) = token {
            self.by_token
                .entry(token.to_string())
                .or_insert_with(|| id.to_string());
        }
        if let Some(path) = path {
            self.by_path
                .entry(path.to_string())
                .or_insert_with(|| id.to_string());
            self.path_ids
                .entry(path.to_string())
                .or_default()
                .push(id.to_string());
        }
    }

    fn resolve(&self, node: &CatalogNode, parent_token: Option<&str>) -> Option<String> {
        if let Some(parent) = parent_token.and_then(|token| self.by_token.get(token)) {
            return Some(parent.clone());
        }
        let path = node.hierarchy_path.as_deref()?;
        if !node.is_folder {
            if let Some(parent) = self.by_path.get(path) {
                return Some(parent.clone());
            }
        }
        parent_path(path).and_then(|parent| self.by_path.get(&parent).cloned())
    }

    fn collisions(&self) -> Vec<PathCollision> {
        self.path_ids
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(path, ids)| PathCollision {
                path: path.clone(),
                ids: ids.clone(),
            })
            .collect()
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a segment length instead of inferring one.
    pub fn with_segment_length(mut self, segment_length: Option<usize>) -> Self {
        self.segment_length = segment_length.filter(|len| *len > 0);
        self
    }

    pub fn build(&self, records: &[RawRecord]) -> Catalog {
        let raw_stats = RawStats::collect(records);
        debug!(
            total = raw_stats.total,
            with_id = raw_stats.with_id,
            with_price = raw_stats.with_price,
            hierarchy_with_separator = raw_stats.hierarchy_with_separator,
            hierarchy_without_separator = raw_stats.hierarchy_without_separator,
            hierarchy_missing = raw_stats.hierarchy_missing,
            folder_hints = raw_stats.folder_hints,
            "raw catalog records analyzed"
        );
        debug!(fields = %raw_stats.field_names.join(", "), types = %raw_stats.type_strings.join(", "), "raw record shape");

        let normalized: Vec<_> = records
            .iter()
            .enumerate()
            .map(|(position, record)| normalize(record, position))
            .collect();
        let segmentation = Segmentation::resolve(
            normalized.iter().filter_map(|record| record.hierarchy.as_deref()),
            self.segment_length,
        );
        debug!(
            length = ?segmentation.length,
            source = ?segmentation.source,
            "hierarchy segmentation resolved"
        );

        let mut report = BuildReport {
            total_records: records.len(),
            segment_length: segmentation.length,
            segment_source: segmentation.source,
            raw_stats,
            ..BuildReport::default()
        };
        let mut nodes: HashMap<String, CatalogNode> = HashMap::with_capacity(records.len());
        let mut index = FolderIndex::default();
        let mut folders: Vec<Pending> = Vec::new();
        let mut items: Vec<Pending> = Vec::new();

        for record in &normalized {
            let path = record
                .hierarchy
                .as_deref()
                .and_then(|token| segmentation.apply(token));
            let id = match (&record.id, &path, record.is_folder) {
                (Some(id), _, _) => id.clone(),
                (None, Some(path), true) => format!("{SYNTHETIC_FOLDER_PREFIX}{path}"),
                (None, _, true) => {
                    report.dropped_folders += 1;
                    continue;
                }
                (None, _, false) => {
                    report.dropped_items += 1;
                    continue;
                }
            };
            if nodes.contains_key(&id) {
                report.duplicate_ids.push(id);
                continue;
            }

            let pending = Pending {
                id: id.clone(),
                parent_token: record.parent_hierarchy.clone(),
            };
            if record.is_folder {
                index.register(&id, record.hierarchy.as_deref(), path.as_deref());
                folders.push(pending);
            } else {
                items.push(pending);
            }
            nodes.insert(id.clone(), CatalogNode::from_record(record, id, path));
        }

        let mut parents: HashMap<String, Option<String>> = HashMap::with_capacity(nodes.len());
        for pending in folders.iter().chain(items.iter()) {
            let Some(node) = nodes.get(&pending.id) else {
                continue;
            };
            let mut parent = index.resolve(node, pending.parent_token.as_deref());
            let cyclic = parent
                .as_deref()
                .is_some_and(|candidate| closes_cycle(&parents, &pending.id, candidate));
            if cyclic {
                report.broken_cycles.push(pending.id.clone());
                parent = None;
            }
            let multi_segment = node
                .hierarchy_path
                .as_deref()
                .is_some_and(|path| path_depth(path) > 1);
            if parent.is_none() && multi_segment && !cyclic {
                report.orphans.push(pending.id.clone());
            }
            parents.insert(pending.id.clone(), parent);
        }

        let mut root = Children::default();
        let mut children: HashMap<String, Children> = HashMap::new();
        for (list, is_folder) in [(&folders, true), (&items, false)] {
            for pending in list {
                let Some(parent) = parents.get(&pending.id) else {
                    continue;
                };
                let slot = match parent {
                    None => &mut root,
                    Some(parent) => children.entry(parent.clone()).or_default(),
                };
                if is_folder {
                    slot.folders.push(pending.id.clone());
                } else {
                    slot.items.push(pending.id.clone());
                }
            }
        }
        for slot in std::iter::once(&mut root).chain(children.values_mut()) {
            sort_children(&mut slot.folders, &nodes);
            sort_children(&mut slot.items, &nodes);
        }

        report.folders = folders.len();
        report.items = items.len();
        report.path_collisions = index.collisions();
        log_report(&report);

        Catalog::from_parts(nodes, parents, root, children, report)
    }
}

/// Whether linking `node` under `candidate` would make `node` its own ancestor.
fn closes_cycle(parents: &HashMap<String, Option<String>>, node: &str, candidate: &str) -> bool {
    let mut cursor = Some(candidate);
    for _ in 0..=parents.len() + 1 {
        match cursor {
            None => return false,
            Some(current) if current == node => return true,
            Some(current) => cursor = parents.get(current).and_then(|parent| parent.as_deref()),
        }
    }
    true
}

fn log_report(report: &BuildReport) {
    info!(
        folders = report.folders,
        items = report.items,
        dropped_folders = report.dropped_folders,
        dropped_items = report.dropped_items,
        "catalog built"
    );
    if !report.duplicate_ids.is_empty() {
        warn!(count = report.duplicate_ids.len(), "duplicate catalog ids dropped");
    }
    if !report.path_collisions.is_empty() {
        warn!(
            count = report.path_collisions.len(),
            "hierarchy path collisions"
        );
        for collision in report.path_collisions.iter().take(MAX_LOGGED_COLLISIONS) {
            debug!(path = %collision.path, ids = ?collision.ids, "path collision");
        }
    }
    if !report.orphans.is_empty() {
        warn!(count = report.orphans.len(), "orphaned catalog nodes placed at root");
        for id in report.orphans.iter().take(MAX_LOGGED_ORPHANS) {
            debug!(id = %id, "orphan");
        }
    }
    if !report.broken_cycles.is_empty() {
        warn!(ids = ?report.broken_cycles, "parent cycles broken");
    }
}
