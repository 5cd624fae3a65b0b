//! Navigation renderer
//!
//! Turns `(scope, page)` into a [`RenderDescriptor`]. Children come from the
//! catalog's base order, merged with the scope's overlay with hidden ids
//! removed. A scope with folders but no items is never shown as is: rendering
//! descends into its first visible folder, bounded by
//! [`RenderOptions::max_descend_depth`].

mod descriptor;
mod pagination;

pub use descriptor::{
    FolderLink, ItemLink, NavigationState, PageLink, RenderDescriptor, RenderNotice, RowGroup,
    SummaryRow,
};
pub use pagination::{clamp_page, page_slice, page_window, price_label, total_pages};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::overlay::{merge, OverlayMap};
use crate::token::ActionToken;

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const DEFAULT_PAGE_WINDOW: usize = 5;
pub const DEFAULT_MAX_DESCEND_DEPTH: usize = 32;

/// Title of the root scope.
pub const ROOT_TITLE: &str = "Menu";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub page_size: usize,
    pub page_window: usize,
    pub max_descend_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_window: DEFAULT_PAGE_WINDOW,
            max_descend_depth: DEFAULT_MAX_DESCEND_DEPTH,
        }
    }
}

/// Read-only view over one catalog snapshot and the current overlays.
pub struct Navigator<'a> {
    catalog: &'a Catalog,
    overlays: &'a OverlayMap,
    options: RenderOptions,
}

impl<'a> Navigator<'a> {
    pub fn new(catalog: &'a Catalog, overlays: &'a OverlayMap, options: RenderOptions) -> Self {
        Self {
            catalog,
            overlays,
            options,
        }
    }

    /// Overlay-ordered folder children of a scope, hidden ones removed.
    pub fn visible_folders(&self, scope: Option<&str>) -> Vec<String> {
        merge(self.catalog.folders(scope), self.overlays.get(scope), false)
    }

    /// Overlay-ordered item children of a scope, hidden ones removed.
    pub fn visible_items(&self, scope: Option<&str>) -> Vec<String> {
        merge(self.catalog.items(scope), self.overlays.get(scope), false)
    }

    /// Visible top-level folders, the start screen of a conversation.
    pub fn top_level(&self) -> Vec<FolderLink> {
        self.visible_folders(None)
            .iter()
            .filter_map(|id| self.folder_link(id, ActionToken::open(Some(id.as_str()), 0)))
            .collect()
    }

    pub fn render(&self, scope: Option<&str>, page: usize, actor_is_admin: bool) -> RenderDescriptor {
        let mut notice = None;
        let mut scope = scope.map(str::to_string);
        let mut page = page;
        if let Some(requested) = scope.clone().filter(|id| !self.catalog.is_scope(Some(id.as_str()))) {
            warn!(scope = %requested, "unknown scope requested, rendering root");
            notice = Some(RenderNotice::UnknownScope { requested });
            scope = None;
            page = 0;
        }

        let mut visited: HashSet<Option<String>> = HashSet::new();
        let (folders, items) = loop {
            let folders = self.visible_folders(scope.as_deref());
            let items = self.visible_items(scope.as_deref());
            if !items.is_empty() || folders.is_empty() {
                break (folders, items);
            }
            visited.insert(scope.clone());
            let next = Some(folders[0].clone());
            if visited.len() > self.options.max_descend_depth || visited.contains(&next) {
                warn!(scope = ?scope, depth = visited.len(), "auto-descend stopped");
                notice.get_or_insert(RenderNotice::DescendLimit {
                    stopped_at: scope.clone(),
                });
                break (folders, items);
            }
            debug!(from = ?scope, to = ?next, "auto-descend");
            scope = next;
            page = 0;
        };

        let pages = total_pages(items.len(), self.options.page_size);
        let page = clamp_page(page, pages);
        let scope_ref = scope.as_deref();
        let mut groups = Vec::new();

        let folder_links: Vec<FolderLink> = folders
            .iter()
            .filter_map(|id| self.folder_link(id, ActionToken::open(Some(id.as_str()), 0)))
            .collect();
        if !folder_links.is_empty() {
            groups.push(RowGroup::Folders {
                links: folder_links,
            });
        }

        let item_links: Vec<ItemLink> = items[page_slice(items.len(), page, self.options.page_size)]
            .iter()
            .filter_map(|id| self.item_link(id))
            .collect();
        if !item_links.is_empty() {
            groups.push(RowGroup::Items { links: item_links });
        }

        if pages > 1 {
            let links = page_window(page, pages, self.options.page_window)
                .into_iter()
                .map(|index| PageLink {
                    page: index,
                    current: index == page,
                    token: ActionToken::open(scope_ref, index),
                })
                .collect();
            groups.push(RowGroup::Pagination { pages: links });
        }

        if let Some(siblings) = scope_ref.and_then(|id| self.siblings(id)) {
            groups.push(siblings);
        }

        groups.push(RowGroup::Summary(SummaryRow {
            title: self.title(scope_ref),
            item_count: items.len(),
            total_pages: pages,
            sort_token: actor_is_admin.then(|| ActionToken::SortOpen {
                scope: scope.clone(),
            }),
        }));

        RenderDescriptor {
            breadcrumb: self
                .catalog
                .breadcrumb(scope_ref)
                .into_iter()
                .map(|node| node.name.clone())
                .collect(),
            scope,
            page,
            total_pages: pages,
            groups,
            notice,
        }
    }

    /// Display title of a scope.
    pub fn title(&self, scope: Option<&str>) -> String {
        scope
            .and_then(|id| self.catalog.node(id))
            .map_or_else(|| ROOT_TITLE.to_string(), |node| node.name.clone())
    }

    /// Previous/next among the parent's visible folders, plus "up" when the
    /// parent is a folder that directly holds items.
    fn siblings(&self, scope: &str) -> Option<RowGroup> {
        let parent = self.catalog.parent_of(scope)?;
        let siblings = self.visible_folders(parent);
        let index = siblings.iter().position(|id| id == scope)?;

        let previous = index
            .checked_sub(1)
            .and_then(|prev| siblings.get(prev))
            .and_then(|id| self.folder_link(id, ActionToken::Sibling { id: id.clone() }));
        let next = siblings
            .get(index + 1)
            .and_then(|id| self.folder_link(id, ActionToken::Sibling { id: id.clone() }));
        let up = parent
            .filter(|parent| !self.catalog.items(Some(*parent)).is_empty())
            .and_then(|parent| {
                self.folder_link(
                    parent,
                    ActionToken::Up {
                        id: parent.to_string(),
                    },
                )
            });

        if previous.is_none() && up.is_none() && next.is_none() {
            return None;
        }
        Some(RowGroup::Siblings { previous, up, next })
    }

    fn folder_link(&self, id: &str, token: ActionToken) -> Option<FolderLink> {
        let node = self.catalog.node(id)?;
        Some(FolderLink {
            id: node.id.clone(),
            name: node.name.clone(),
            token,
        })
    }

    fn item_link(&self, id: &str) -> Option<ItemLink> {
        let node = self.catalog.node(id)?;
        Some(ItemLink {
            id: node.id.clone(),
            name: node.name.clone(),
            price: node.price,
            price_label: price_label(node.price),
            token: ActionToken::Item {
                id: node.id.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::overlay::OverlayRecord;
    use crate::record::extract_records;
    use serde_json::{json, Value};
    use std::collections::BTreeSet;

    fn catalog(value: Value) -> Catalog {
        CatalogBuilder::new().build(&extract_records(value))
    }

    fn overlay(parent: Option<&str>, order: &[&str], hidden: &[&str]) -> OverlayRecord {
        OverlayRecord::new(
            parent.map(str::to_string),
            order.iter().map(|id| id.to_string()).collect(),
            hidden.iter().map(|id| id.to_string()).collect::<BTreeSet<_>>(),
        )
    }

    fn item_ids(descriptor: &RenderDescriptor) -> Vec<&str> {
        descriptor
            .item_links()
            .iter()
            .map(|link| link.id.as_str())
            .collect()
    }

    fn folder_ids(descriptor: &RenderDescriptor) -> Vec<&str> {
        descriptor
            .folder_links()
            .iter()
            .map(|link| link.id.as_str())
            .collect()
    }

    fn menu() -> Catalog {
        catalog(json!([
            {"id": "food", "name": "Food", "path": "1"},
            {"id": "soups", "name": "Soups", "path": "1.1"},
            {"id": "salads", "name": "Salads", "path": "1.2"},
            {"id": "hot", "name": "Hot", "path": "1.3"},
            {"id": "drinks", "name": "Drinks", "path": "2"},
            {"id": "borscht", "name": "Borscht", "price": 300, "path": "1.1.1"},
            {"id": "caesar", "name": "Caesar", "price": 450.4, "path": "1.2.1"},
            {"id": "steak", "name": "Steak", "price": 900, "path": "1.3.1"},
            {"id": "cola", "name": "Cola", "price": 120, "path": "2.1"},
            {"id": "water", "name": "Water", "path": "2.2", "price": 60}
        ]))
    }

    #[test]
    fn test_auto_descend_into_first_folder() {
        let catalog = menu();
        let overlays = OverlayMap::new();
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        let root = nav.render(None, 0, false);
        assert_eq!(root, nav.render(Some("food"), 0, false));
        assert_eq!(root, nav.render(Some("soups"), 0, false));
        assert_eq!(root.scope.as_deref(), Some("soups"));
        assert_eq!(item_ids(&root), vec!["borscht"]);
        assert_eq!(root.breadcrumb, vec!["Food", "Soups"]);
    }

    #[test]
    fn test_auto_descend_follows_overlay_order() {
        let catalog = menu();
        let overlays = OverlayMap::from_records([overlay(Some("food"), &["hot"], &[])]);
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        assert_eq!(nav.render(Some("food"), 3, false).scope.as_deref(), Some("hot"));

        let hidden = OverlayMap::from_records([overlay(None, &[], &["food"])]);
        let nav = Navigator::new(&catalog, &hidden, RenderOptions::default());
        assert_eq!(nav.render(None, 0, false).scope.as_deref(), Some("drinks"));
    }

    #[test]
    fn test_descend_limit_renders_folders_with_notice() {
        let catalog = menu();
        let overlays = OverlayMap::new();
        let options = RenderOptions {
            max_descend_depth: 1,
            ..RenderOptions::default()
        };
        let nav = Navigator::new(&catalog, &overlays, options);
        let rendered = nav.render(None, 0, false);
        assert_eq!(rendered.scope.as_deref(), Some("food"));
        assert_eq!(folder_ids(&rendered), vec!["soups", "salads", "hot"]);
        assert!(rendered.item_links().is_empty());
        assert_eq!(
            rendered.notice,
            Some(RenderNotice::DescendLimit {
                stopped_at: Some("food".to_string())
            })
        );
    }

    #[test]
    fn test_unknown_scope_falls_back_to_root() {
        let catalog = menu();
        let overlays = OverlayMap::new();
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        for stale in ["gone", "cola"] {
            let rendered = nav.render(Some(stale), 2, false);
            assert_eq!(rendered.scope.as_deref(), Some("soups"));
            assert_eq!(
                rendered.notice,
                Some(RenderNotice::UnknownScope {
                    requested: stale.to_string()
                })
            );
        }
    }

    #[test]
    fn test_empty_catalog_renders_summary_only() {
        let catalog = Catalog::empty();
        let overlays = OverlayMap::new();
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        let rendered = nav.render(None, 0, true);
        assert_eq!(rendered.groups.len(), 1);
        let summary = rendered.summary().unwrap();
        assert_eq!(summary.title, ROOT_TITLE);
        assert_eq!(summary.total_pages, 0);
        assert_eq!(
            summary.sort_token,
            Some(ActionToken::SortOpen { scope: None })
        );
    }

    #[test]
    fn test_pagination_window_and_clamp() {
        let records: Vec<Value> = (0..40)
            .map(|i| json!({"id": format!("i{i}"), "name": format!("Item {i}"), "price": i}))
            .collect();
        let catalog = catalog(Value::Array(records));
        let overlays = OverlayMap::new();
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());

        let first = nav.render(None, 0, false);
        assert_eq!(first.total_pages, 4);
        assert_eq!(first.item_links().len(), 12);
        let pages: Vec<usize> = first.page_links().iter().map(|p| p.page).collect();
        assert_eq!(pages, vec![0, 1, 2]);
        assert!(first.page_links()[0].current);

        let last = nav.render(None, 99, false);
        assert_eq!(last.page, 3);
        assert_eq!(item_ids(&last), vec!["i36", "i37", "i38", "i39"]);
        assert_eq!(last.page_links().last().unwrap().token, ActionToken::open(None, 3));
    }

    #[test]
    fn test_single_page_has_no_selector() {
        let catalog = menu();
        let overlays = OverlayMap::new();
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        assert!(nav.render(Some("drinks"), 0, false).page_links().is_empty());
    }

    #[test]
    fn test_hidden_items_are_filtered() {
        let catalog = menu();
        let overlays = OverlayMap::from_records([overlay(Some("drinks"), &["water"], &["cola"])]);
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        let rendered = nav.render(Some("drinks"), 0, false);
        assert_eq!(item_ids(&rendered), vec!["water"]);
        assert_eq!(rendered.summary().unwrap().item_count, 1);
    }

    #[test]
    fn test_siblings_without_up_when_parent_has_no_items() {
        let catalog = menu();
        let overlays = OverlayMap::new();
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        let rendered = nav.render(Some("salads"), 0, false);
        let (previous, up, next) = rendered.siblings().unwrap();
        assert_eq!(previous.unwrap().id, "soups");
        assert_eq!(next.unwrap().id, "hot");
        assert_eq!(
            next.unwrap().token,
            ActionToken::Sibling {
                id: "hot".to_string()
            }
        );
        assert!(up.is_none());
    }

    #[test]
    fn test_up_link_when_parent_holds_items() {
        let catalog = catalog(json!([
            {"id": "bar", "name": "Bar", "path": "1"},
            {"id": "wine", "name": "Wine", "path": "1.1"},
            {"id": "beer", "name": "Beer", "path": "1.2"},
            {"id": "nuts", "name": "Nuts", "price": 90, "path": "1.9"},
            {"id": "merlot", "name": "Merlot", "price": 800, "path": "1.1.1"}
        ]));
        let overlays = OverlayMap::new();
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        let rendered = nav.render(Some("wine"), 0, false);
        let (previous, up, next) = rendered.siblings().unwrap();
        assert!(previous.is_none());
        assert_eq!(next.unwrap().id, "beer");
        assert_eq!(
            up.unwrap().token,
            ActionToken::Up {
                id: "bar".to_string()
            }
        );

        let bar = nav.render(Some("bar"), 0, false);
        assert_eq!(folder_ids(&bar), vec!["wine", "beer"]);
        assert_eq!(item_ids(&bar), vec!["nuts"]);
        assert!(bar.siblings().is_none());
    }

    #[test]
    fn test_item_links_carry_price_labels() {
        let catalog = menu();
        let overlays = OverlayMap::new();
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        let rendered = nav.render(Some("salads"), 0, false);
        assert_eq!(rendered.item_links()[0].price_label, "450 ₽");
        assert_eq!(
            rendered.summary().unwrap().sort_token,
            None
        );
    }

    #[test]
    fn test_top_level_respects_overlay() {
        let catalog = menu();
        let overlays = OverlayMap::from_records([overlay(None, &["drinks"], &[])]);
        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        let names: Vec<String> = nav.top_level().into_iter().map(|link| link.name).collect();
        assert_eq!(names, vec!["Drinks", "Food"]);
    }
}
