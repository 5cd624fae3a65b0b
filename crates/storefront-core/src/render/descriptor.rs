//! Render descriptor types handed to the transport layer.

use serde::{Deserialize, Serialize};

use crate::token::ActionToken;

/// Where a conversation currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub scope: Option<String>,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderLink {
    pub id: String,
    pub name: String,
    pub token: ActionToken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLink {
    pub id: String,
    pub name: String,
    pub price: Option<f64>,
    pub price_label: String,
    pub token: ActionToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    /// Zero-based page index.
    pub page: usize,
    pub current: bool,
    pub token: ActionToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub title: String,
    pub item_count: usize,
    pub total_pages: usize,
    /// Enter sort mode at this scope; only for privileged actors.
    pub sort_token: Option<ActionToken>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowGroup {
    Folders {
        links: Vec<FolderLink>,
    },
    Items {
        links: Vec<ItemLink>,
    },
    Pagination {
        pages: Vec<PageLink>,
    },
    Siblings {
        previous: Option<FolderLink>,
        up: Option<FolderLink>,
        next: Option<FolderLink>,
    },
    Summary(SummaryRow),
}

/// Non-fatal conditions met while rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderNotice {
    /// The requested scope is gone; root was rendered instead.
    UnknownScope { requested: String },
    /// Auto-descend stopped at this scope.
    DescendLimit { stopped_at: Option<String> },
}

/// Everything needed to draw one navigation screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderDescriptor {
    /// Scope actually rendered, after auto-descend.
    pub scope: Option<String>,
    pub page: usize,
    pub total_pages: usize,
    /// Folder names from the top level down to the scope.
    pub breadcrumb: Vec<String>,
    pub groups: Vec<RowGroup>,
    pub notice: Option<RenderNotice>,
}

impl RenderDescriptor {
    pub fn state(&self) -> NavigationState {
        NavigationState {
            scope: self.scope.clone(),
            page: self.page,
        }
    }

    pub fn folder_links(&self) -> &[FolderLink] {
        self.groups
            .iter()
            .find_map(|group| match group {
                RowGroup::Folders { links } => Some(links.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn item_links(&self) -> &[ItemLink] {
        self.groups
            .iter()
            .find_map(|group| match group {
                RowGroup::Items { links } => Some(links.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn page_links(&self) -> &[PageLink] {
        self.groups
            .iter()
            .find_map(|group| match group {
                RowGroup::Pagination { pages } => Some(pages.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn siblings(&self) -> Option<(Option<&FolderLink>, Option<&FolderLink>, Option<&FolderLink>)> {
        self.groups.iter().find_map(|group| match group {
            RowGroup::Siblings { previous, up, next } => {
                Some((previous.as_ref(), up.as_ref(), next.as_ref()))
            }
            _ => None,
        })
    }

    pub fn summary(&self) -> Option<&SummaryRow> {
        self.groups.iter().find_map(|group| match group {
            RowGroup::Summary(row) => Some(row),
            _ => None,
        })
    }
}
