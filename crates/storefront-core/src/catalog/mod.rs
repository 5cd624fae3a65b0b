//! Catalog snapshot
//!
//! A [`Catalog`] is one immutable build of the tree: nodes, the parent index,
//! and the sorted children index. Root is `None` wherever a scope or a parent
//! is expected. Refreshing builds a new snapshot; a live one is never mutated.

mod builder;
mod sort;

pub use builder::{CatalogBuilder, SYNTHETIC_FOLDER_PREFIX};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{tree_preview, BuildReport};
use crate::record::NormalizedRecord;

/// One resolved folder or item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogNode {
    pub id: String,
    pub name: String,
    pub price: Option<f64>,
    pub is_folder: bool,
    /// Normalized, segmented hierarchy path.
    pub hierarchy_path: Option<String>,
    /// Explicit order index, or the record position when absent.
    pub order_index: f64,
    /// Position of the source record in the fetched list.
    pub position: usize,
}

impl CatalogNode {
    pub(crate) fn from_record(
        record: &NormalizedRecord,
        id: String,
        hierarchy_path: Option<String>,
    ) -> Self {
        Self {
            id,
            name: record.name.clone(),
            price: if record.is_folder { None } else { record.price },
            is_folder: record.is_folder,
            hierarchy_path,
            order_index: record.effective_order(),
            position: record.position,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Children {
    pub(crate) folders: Vec<String>,
    pub(crate) items: Vec<String>,
}

/// Immutable catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    nodes: HashMap<String, CatalogNode>,
    parents: HashMap<String, Option<String>>,
    root: Children,
    children: HashMap<String, Children>,
    report: BuildReport,
}

impl Catalog {
    /// Snapshot with no nodes, served before the first build.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        nodes: HashMap<String, CatalogNode>,
        parents: HashMap<String, Option<String>>,
        root: Children,
        children: HashMap<String, Children>,
        report: BuildReport,
    ) -> Self {
        Self {
            nodes,
            parents,
            root,
            children,
            report,
        }
    }

    pub fn node(&self, id: &str) -> Option<&CatalogNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CatalogNode> {
        self.nodes.values()
    }

    /// Parent of a node. `None` for unknown ids, `Some(None)` for root children.
    pub fn parent_of(&self, id: &str) -> Option<Option<&str>> {
        self.parents.get(id).map(|parent| parent.as_deref())
    }

    /// Base-ordered folder children of a scope.
    pub fn folders(&self, scope: Option<&str>) -> &[String] {
        self.children_of(scope)
            .map(|children| children.folders.as_slice())
            .unwrap_or(&[])
    }

    /// Base-ordered item children of a scope.
    pub fn items(&self, scope: Option<&str>) -> &[String] {
        self.children_of(scope)
            .map(|children| children.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_folder(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(|node| node.is_folder)
    }

    /// Whether a scope can be rendered: root, or a known folder.
    pub fn is_scope(&self, scope: Option<&str>) -> bool {
        scope.map_or(true, |id| self.is_folder(id))
    }

    /// Folders from the topmost ancestor down to `scope`, inclusive.
    pub fn breadcrumb(&self, scope: Option<&str>) -> Vec<&CatalogNode> {
        let mut trail = Vec::new();
        let mut cursor = scope;
        while let Some(id) = cursor {
            let Some(node) = self.nodes.get(id) else {
                break;
            };
            trail.push(node);
            if trail.len() > self.nodes.len() {
                break;
            }
            cursor = self.parent_of(id).flatten();
        }
        trail.reverse();
        trail
    }

    /// Number of parent links between a node and root.
    pub fn depth(&self, id: &str) -> usize {
        self.breadcrumb(Some(id)).len()
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn preview(&self, max_folders: usize, max_items: usize) -> String {
        tree_preview(self, max_folders, max_items)
    }

    fn children_of(&self, scope: Option<&str>) -> Option<&Children> {
        match scope {
            None => Some(&self.root),
            Some(id) => self.children.get(id),
        }
    }
}
