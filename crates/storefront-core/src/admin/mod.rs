//! Admin sort mode
//!
//! A privileged actor reorders and hides the children of one scope at a time.
//! The session only plans edits: every mutating call returns the full
//! [`OverlayRecord`] to persist, and the caller writes it through the overlay
//! store and its live overlay map. The privilege check itself is the caller's.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::overlay::{merge_tagged, MergedEntry, OverlayMap, OverlayRecord};
use crate::render::{FolderLink, ROOT_TITLE};
use crate::token::ActionToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortState {
    #[default]
    Idle,
    /// Editing the children of a scope; `None` is root.
    Scoped(Option<String>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortError {
    #[error("sort mode is not active")]
    NotInSortMode,

    #[error("unknown sort scope: {0}")]
    UnknownScope(String),

    #[error("{0} is not a child of the current sort scope")]
    UnknownChild(String),
}

/// One child row of the sort view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
    pub hidden: bool,
    pub move_up: ActionToken,
    pub toggle: ActionToken,
    pub move_down: ActionToken,
}

/// Sort-mode screen for one scope, hidden children included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortView {
    pub scope: Option<String>,
    pub title: String,
    pub entries: Vec<SortEntry>,
    /// Open the parent scope; absent at root.
    pub parent: Option<ActionToken>,
    pub subfolders: Vec<FolderLink>,
    pub exit: ActionToken,
}

/// Sort-mode state of one admin actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSession {
    state: SortState,
}

/// Unfiltered children of a scope: folders, then items.
struct ScopeChildren {
    folders: Vec<MergedEntry>,
    items: Vec<MergedEntry>,
}

impl ScopeChildren {
    fn collect(catalog: &Catalog, overlays: &OverlayMap, scope: Option<&str>) -> Self {
        let overlay = overlays.get(scope);
        Self {
            folders: merge_tagged(catalog.folders(scope), overlay),
            items: merge_tagged(catalog.items(scope), overlay),
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.folders
            .iter()
            .chain(self.items.iter())
            .any(|entry| entry.id == id)
    }

    fn ordered_ids(&self) -> Vec<String> {
        self.folders
            .iter()
            .chain(self.items.iter())
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Swap `id` with its neighbour inside its own list. `None` at a boundary.
    fn swap(&mut self, id: &str, direction: MoveDirection) -> Option<()> {
        let list = if self.folders.iter().any(|entry| entry.id == id) {
            &mut self.folders
        } else {
            &mut self.items
        };
        let index = list.iter().position(|entry| entry.id == id)?;
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1)?,
            MoveDirection::Down => Some(index + 1).filter(|next| *next < list.len())?,
        };
        list.swap(index, target);
        Some(())
    }
}

impl SortSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SortState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SortState::Scoped(_))
    }

    pub fn scope(&self) -> Result<Option<&str>, SortError> {
        match &self.state {
            SortState::Idle => Err(SortError::NotInSortMode),
            SortState::Scoped(scope) => Ok(scope.as_deref()),
        }
    }

    /// Start, or restart, at root.
    pub fn enter(&mut self) {
        self.state = SortState::Scoped(None);
    }

    pub fn open(&mut self, catalog: &Catalog, target: Option<&str>) -> Result<(), SortError> {
        self.scope()?;
        if let Some(id) = target.filter(|id| !catalog.is_folder(id)) {
            return Err(SortError::UnknownScope(id.to_string()));
        }
        self.state = SortState::Scoped(target.map(str::to_string));
        Ok(())
    }

    /// Leave sort mode. Returns whether it was active.
    pub fn exit(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = SortState::Idle;
        was_active
    }

    /// Record to persist after moving `id` one step, or `None` when it is
    /// already at the edge of its list.
    pub fn plan_move(
        &self,
        catalog: &Catalog,
        overlays: &OverlayMap,
        id: &str,
        direction: MoveDirection,
    ) -> Result<Option<OverlayRecord>, SortError> {
        let scope = self.checked_scope(catalog)?;
        let mut children = ScopeChildren::collect(catalog, overlays, scope);
        if !children.contains(id) {
            return Err(SortError::UnknownChild(id.to_string()));
        }
        if children.swap(id, direction).is_none() {
            return Ok(None);
        }
        let ordered_ids = children.ordered_ids();
        Ok(Some(match overlays.get(scope) {
            Some(existing) => existing.with_order(ordered_ids),
            None => OverlayRecord::new(scope.map(str::to_string), ordered_ids, Default::default()),
        }))
    }

    /// Record to persist after flipping the hidden flag of `id`.
    pub fn plan_toggle(
        &self,
        catalog: &Catalog,
        overlays: &OverlayMap,
        id: &str,
    ) -> Result<OverlayRecord, SortError> {
        let scope = self.checked_scope(catalog)?;
        if !ScopeChildren::collect(catalog, overlays, scope).contains(id) {
            return Err(SortError::UnknownChild(id.to_string()));
        }
        Ok(match overlays.get(scope) {
            Some(existing) => existing.with_toggled(id),
            None => OverlayRecord::natural(scope.map(str::to_string)).with_toggled(id),
        })
    }

    pub fn view(&self, catalog: &Catalog, overlays: &OverlayMap) -> Result<SortView, SortError> {
        let scope = self.checked_scope(catalog)?;
        let children = ScopeChildren::collect(catalog, overlays, scope);
        let owned_scope = scope.map(str::to_string);

        let entries = children
            .folders
            .iter()
            .chain(children.items.iter())
            .filter_map(|entry| {
                let node = catalog.node(&entry.id)?;
                let mv = |direction| ActionToken::SortMove {
                    scope: owned_scope.clone(),
                    id: entry.id.clone(),
                    direction,
                };
                Some(SortEntry {
                    id: entry.id.clone(),
                    name: node.name.clone(),
                    is_folder: node.is_folder,
                    hidden: entry.hidden,
                    move_up: mv(MoveDirection::Up),
                    toggle: ActionToken::SortToggle {
                        scope: owned_scope.clone(),
                        id: entry.id.clone(),
                    },
                    move_down: mv(MoveDirection::Down),
                })
            })
            .collect();

        let subfolders = children
            .folders
            .iter()
            .filter_map(|entry| {
                let node = catalog.node(&entry.id)?;
                Some(FolderLink {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    token: ActionToken::SortOpen {
                        scope: Some(node.id.clone()),
                    },
                })
            })
            .collect();

        let parent = scope.map(|id| ActionToken::SortOpen {
            scope: catalog.parent_of(id).flatten().map(str::to_string),
        });
        let title = scope
            .and_then(|id| catalog.node(id))
            .map_or_else(|| ROOT_TITLE.to_string(), |node| node.name.clone());

        Ok(SortView {
            scope: owned_scope,
            title,
            entries,
            parent,
            subfolders,
            exit: ActionToken::SortExit,
        })
    }

    fn checked_scope(&self, catalog: &Catalog) -> Result<Option<&str>, SortError> {
        let scope = self.scope()?;
        match scope {
            Some(id) if !catalog.is_folder(id) => Err(SortError::UnknownScope(id.to_string())),
            _ => Ok(scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::record::extract_records;
    use crate::render::{Navigator, RenderOptions};
    use serde_json::json;

    fn catalog() -> Catalog {
        CatalogBuilder::new().build(&extract_records(json!([
            {"id": "A", "name": "Alpha", "path": "1"},
            {"id": "B", "name": "Beta", "path": "2"},
            {"id": "C", "name": "Gamma", "path": "3"},
            {"id": "a1", "name": "Apple", "price": 10, "path": "1.1"},
            {"id": "a2", "name": "Apricot", "price": 20, "path": "1.2"},
            {"id": "A9", "name": "Nested", "path": "1.9"}
        ])))
    }

    fn scoped(scope: Option<&str>) -> SortSession {
        SortSession {
            state: SortState::Scoped(scope.map(str::to_string)),
        }
    }

    fn apply(overlays: &mut OverlayMap, record: OverlayRecord) {
        overlays.insert(record);
    }

    #[test]
    fn test_transitions() {
        let catalog = catalog();
        let mut session = SortSession::new();
        assert_eq!(session.open(&catalog, Some("A")), Err(SortError::NotInSortMode));

        session.enter();
        assert_eq!(session.state(), &SortState::Scoped(None));
        session.open(&catalog, Some("A")).unwrap();
        assert_eq!(session.scope(), Ok(Some("A")));
        assert_eq!(
            session.open(&catalog, Some("a1")),
            Err(SortError::UnknownScope("a1".to_string()))
        );
        session.enter();
        assert_eq!(session.scope(), Ok(None));
        assert!(session.exit());
        assert!(!session.exit());
        assert_eq!(session.scope(), Err(SortError::NotInSortMode));
    }

    #[test]
    fn test_move_scenario() {
        let catalog = catalog();
        let mut overlays = OverlayMap::new();
        apply(
            &mut overlays,
            OverlayRecord::new(None, vec!["C".into(), "A".into()], Default::default()),
        );
        let session = scoped(None);

        let noop = session
            .plan_move(&catalog, &overlays, "C", MoveDirection::Up)
            .unwrap();
        assert!(noop.is_none());

        let record = session
            .plan_move(&catalog, &overlays, "C", MoveDirection::Down)
            .unwrap()
            .unwrap();
        assert_eq!(record.parent_id, None);
        assert_eq!(record.ordered_ids, vec!["A", "C", "B"]);

        let at_end = session
            .plan_move(&catalog, &overlays, "B", MoveDirection::Down)
            .unwrap();
        assert!(at_end.is_none());
    }

    #[test]
    fn test_move_stays_within_own_list() {
        let catalog = catalog();
        let overlays = OverlayMap::new();
        let session = scoped(Some("A"));
        assert!(session
            .plan_move(&catalog, &overlays, "a1", MoveDirection::Up)
            .unwrap()
            .is_none());
        let record = session
            .plan_move(&catalog, &overlays, "a2", MoveDirection::Up)
            .unwrap()
            .unwrap();
        assert_eq!(record.parent_id.as_deref(), Some("A"));
        assert_eq!(record.ordered_ids, vec!["A9", "a2", "a1"]);
    }

    #[test]
    fn test_move_keeps_hidden_set_and_hidden_ids() {
        let catalog = catalog();
        let mut overlays = OverlayMap::new();
        apply(
            &mut overlays,
            OverlayRecord::new(None, Vec::new(), ["B".to_string()].into()),
        );
        let session = scoped(None);
        let record = session
            .plan_move(&catalog, &overlays, "A", MoveDirection::Down)
            .unwrap()
            .unwrap();
        assert_eq!(record.ordered_ids, vec!["B", "A", "C"]);
        assert!(record.is_hidden("B"));
    }

    #[test]
    fn test_unknown_child_rejected() {
        let catalog = catalog();
        let overlays = OverlayMap::new();
        let session = scoped(None);
        assert_eq!(
            session.plan_move(&catalog, &overlays, "a1", MoveDirection::Up),
            Err(SortError::UnknownChild("a1".to_string()))
        );
        assert_eq!(
            session.plan_toggle(&catalog, &overlays, "zzz"),
            Err(SortError::UnknownChild("zzz".to_string()))
        );
        assert_eq!(
            SortSession::new().plan_toggle(&catalog, &overlays, "A"),
            Err(SortError::NotInSortMode)
        );
    }

    #[test]
    fn test_toggle_hides_for_users_and_tags_for_admins() {
        let catalog = catalog();
        let mut overlays = OverlayMap::new();
        let session = scoped(None);
        let record = session.plan_toggle(&catalog, &overlays, "B").unwrap();
        assert!(record.ordered_ids.is_empty());
        apply(&mut overlays, record);

        let nav = Navigator::new(&catalog, &overlays, RenderOptions::default());
        assert_eq!(nav.visible_folders(None), vec!["A", "C"]);

        let view = session.view(&catalog, &overlays).unwrap();
        let beta = view.entries.iter().find(|entry| entry.id == "B").unwrap();
        assert!(beta.hidden);
        assert_eq!(view.entries.len(), 3);

        let restored = session.plan_toggle(&catalog, &overlays, "B").unwrap();
        assert!(restored.hidden_ids.is_empty());
    }

    #[test]
    fn test_view_tokens() {
        let catalog = catalog();
        let overlays = OverlayMap::new();
        let view = scoped(Some("A")).view(&catalog, &overlays).unwrap();
        assert_eq!(view.title, "Alpha");
        assert_eq!(view.parent, Some(ActionToken::SortOpen { scope: None }));
        let ids: Vec<&str> = view.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["A9", "a1", "a2"]);
        assert_eq!(view.subfolders.len(), 1);
        assert_eq!(
            view.subfolders[0].token,
            ActionToken::SortOpen {
                scope: Some("A9".to_string())
            }
        );
        assert_eq!(
            view.entries[1].move_down,
            ActionToken::SortMove {
                scope: Some("A".to_string()),
                id: "a1".to_string(),
                direction: MoveDirection::Down
            }
        );
        assert_eq!(view.exit, ActionToken::SortExit);

        let root = scoped(None).view(&catalog, &overlays).unwrap();
        assert_eq!(root.title, ROOT_TITLE);
        assert!(root.parent.is_none());
    }
}
