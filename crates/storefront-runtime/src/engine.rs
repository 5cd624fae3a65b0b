//! Menu engine: catalog snapshot, overlays and sessions behind one API.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use storefront_config::MenuConfig;
use storefront_core::admin::{MoveDirection, SortError, SortSession, SortView};
use storefront_core::catalog::{Catalog, CatalogBuilder, CatalogNode};
use storefront_core::diagnostics::BuildReport;
use storefront_core::overlay::OverlayStore;
use storefront_core::render::{
    FolderLink, NavigationState, Navigator, RenderDescriptor, RenderOptions,
};
use storefront_core::token::{ActionToken, TokenError};

use crate::bootstrap::BootstrapError;
use crate::overlays::OverlayRegistry;
use crate::session::{ActorId, ConversationId, SessionRegistry};
use crate::snapshot::CatalogHandle;
use crate::source::{fetch_with_retry, CatalogSource, RetryPolicy, SourceError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub render: RenderOptions,
    /// Forced hierarchy segment length; inferred when `None`.
    pub segment_length: Option<usize>,
    pub retry: RetryPolicy,
    pub admin_ids: BTreeSet<i64>,
}

impl From<&MenuConfig> for EngineOptions {
    fn from(config: &MenuConfig) -> Self {
        Self {
            render: RenderOptions {
                page_size: config.catalog.page_size,
                page_window: config.catalog.page_window,
                max_descend_depth: config.catalog.max_descend_depth,
            },
            segment_length: config.catalog.segment_length,
            retry: RetryPolicy::from(&config.source),
            admin_ids: config.admin.actor_ids.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("sort error: {0}")]
    Sort(#[from] SortError),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
    #[error("catalog refresh failed: {0}")]
    Refresh(#[from] SourceError),
}

/// Outcome of dispatching one action token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineResponse {
    Render(RenderDescriptor),
    /// An item was chosen; what happens next belongs to the transport.
    ItemSelected(CatalogNode),
    SortView(SortView),
    /// Sort mode ended; fresh top-level folder links.
    TopLevel { folders: Vec<FolderLink> },
    Ignored,
}

pub struct MenuEngine {
    catalog: CatalogHandle,
    overlays: OverlayRegistry,
    sessions: SessionRegistry,
    source: Arc<dyn CatalogSource>,
    options: EngineOptions,
}

impl MenuEngine {
    /// Fetch and build the first snapshot, then load overlays.
    ///
    /// A catalog that cannot be fetched fails startup. An overlay store that
    /// cannot be read only costs the stored order: the engine starts with
    /// natural order everywhere.
    pub async fn start(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn OverlayStore>,
        options: EngineOptions,
    ) -> Result<Self, BootstrapError> {
        let records = fetch_with_retry(source.as_ref(), &options.retry).await?;
        let catalog = CatalogBuilder::new()
            .with_segment_length(options.segment_length)
            .build(&records);

        let overlays = OverlayRegistry::new(store);
        if let Err(err) = overlays.load().await {
            warn!(error = %err, "overlay load failed; starting with natural order");
        }

        info!(
            nodes = catalog.len(),
            admins = options.admin_ids.len(),
            "menu engine started"
        );
        Ok(Self {
            catalog: CatalogHandle::new(catalog),
            overlays,
            sessions: SessionRegistry::new(),
            source,
            options,
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Whether `actor` is listed as an admin in the configuration.
    pub fn is_admin(&self, actor: ActorId) -> bool {
        self.options.admin_ids.contains(&actor)
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.load()
    }

    pub fn diagnostics(&self) -> BuildReport {
        self.catalog.load().report().clone()
    }

    pub fn preview(&self, max_folders: usize, max_items: usize) -> String {
        self.catalog.load().preview(max_folders, max_items)
    }

    /// Rebuild the catalog from the source. On failure the previous snapshot
    /// stays in place.
    pub async fn refresh(&self) -> Result<BuildReport, EngineError> {
        let records = match fetch_with_retry(self.source.as_ref(), &self.options.retry).await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "catalog refresh failed; keeping previous snapshot");
                return Err(err.into());
            }
        };
        let catalog = CatalogBuilder::new()
            .with_segment_length(self.options.segment_length)
            .build(&records);
        let report = catalog.report().clone();
        let previous = self.catalog.replace(catalog);
        info!(
            previous_nodes = previous.len(),
            nodes = report.folders + report.items,
            "catalog snapshot replaced"
        );
        Ok(report)
    }

    /// Render a scope for a conversation and remember where it landed.
    pub async fn render(
        &self,
        conversation: ConversationId,
        scope: Option<&str>,
        page: usize,
        is_admin: bool,
    ) -> RenderDescriptor {
        let catalog = self.catalog.load();
        let overlays = self.overlays.snapshot();
        let descriptor =
            Navigator::new(&catalog, &overlays, self.options.render).render(scope, page, is_admin);
        self.sessions
            .set_navigation(conversation, descriptor.state())
            .await;
        descriptor
    }

    pub async fn navigation_state(&self, conversation: ConversationId) -> Option<NavigationState> {
        self.sessions.navigation(conversation).await
    }

    /// Visible top-level folders, for a persistent menu.
    pub async fn top_level(&self) -> Vec<FolderLink> {
        let catalog = self.catalog.load();
        let overlays = self.overlays.snapshot();
        Navigator::new(&catalog, &overlays, self.options.render).top_level()
    }

    /// Decode and dispatch a raw callback string. Strings without the menu
    /// prefix are ignored.
    pub async fn dispatch_raw(
        &self,
        conversation: ConversationId,
        actor: ActorId,
        is_admin: bool,
        raw: &str,
    ) -> Result<EngineResponse, EngineError> {
        if !ActionToken::is_ours(raw) {
            return Ok(EngineResponse::Ignored);
        }
        let token: ActionToken = raw.parse()?;
        self.dispatch(conversation, actor, is_admin, &token).await
    }

    pub async fn dispatch(
        &self,
        conversation: ConversationId,
        actor: ActorId,
        is_admin: bool,
        token: &ActionToken,
    ) -> Result<EngineResponse, EngineError> {
        debug!(conversation, actor, token = %token, "dispatching action");
        match token {
            ActionToken::Open { scope, page } => Ok(EngineResponse::Render(
                self.render(conversation, scope.as_deref(), *page, is_admin)
                    .await,
            )),
            ActionToken::Sibling { id } | ActionToken::Up { id } => Ok(EngineResponse::Render(
                self.render(conversation, Some(id.as_str()), 0, is_admin)
                    .await,
            )),
            ActionToken::Item { id } => match self.catalog.load().node(id) {
                Some(node) if !node.is_folder => Ok(EngineResponse::ItemSelected(node.clone())),
                _ => Ok(EngineResponse::Render(
                    self.render(conversation, Some(id.as_str()), 0, is_admin)
                        .await,
                )),
            },
            _ if !is_admin => {
                warn!(actor, token = %token, "sort action from non-admin ignored");
                Ok(EngineResponse::Ignored)
            }
            ActionToken::SortOpen { scope } => {
                if !self.sessions.sort_session(actor).await.is_active() {
                    self.sort_enter(actor).await?;
                }
                Ok(EngineResponse::SortView(
                    self.sort_open(actor, scope.as_deref()).await?,
                ))
            }
            ActionToken::SortMove {
                scope,
                id,
                direction,
            } => {
                self.align_sort_scope(actor, scope.as_deref()).await?;
                Ok(EngineResponse::SortView(
                    self.sort_move(actor, id, *direction).await?,
                ))
            }
            ActionToken::SortToggle { scope, id } => {
                self.align_sort_scope(actor, scope.as_deref()).await?;
                Ok(EngineResponse::SortView(
                    self.sort_toggle_hidden(actor, id).await?,
                ))
            }
            ActionToken::SortExit => Ok(EngineResponse::TopLevel {
                folders: self.sort_exit(actor).await,
            }),
        }
    }

    /// Enter sort mode at root.
    pub async fn sort_enter(&self, actor: ActorId) -> Result<SortView, EngineError> {
        let mut session = SortSession::new();
        session.enter();
        let view = self.sort_view(&session).await?;
        self.sessions.store_sort_session(actor, session).await;
        info!(actor, "sort mode entered");
        Ok(view)
    }

    pub async fn sort_open(
        &self,
        actor: ActorId,
        scope: Option<&str>,
    ) -> Result<SortView, EngineError> {
        let mut session = self.sessions.sort_session(actor).await;
        session.open(&self.catalog.load(), scope)?;
        let view = self.sort_view(&session).await?;
        self.sessions.store_sort_session(actor, session).await;
        Ok(view)
    }

    /// Move a child one step. At the edge of its list nothing is persisted
    /// and the current view comes back.
    pub async fn sort_move(
        &self,
        actor: ActorId,
        id: &str,
        direction: MoveDirection,
    ) -> Result<SortView, EngineError> {
        let session = self.sessions.sort_session(actor).await;
        let catalog = self.catalog.load();
        let overlays = self.overlays.snapshot();
        if let Some(record) = session.plan_move(&catalog, &overlays, id, direction)? {
            self.overlays.apply(record).await;
        }
        self.sort_view(&session).await
    }

    pub async fn sort_toggle_hidden(
        &self,
        actor: ActorId,
        id: &str,
    ) -> Result<SortView, EngineError> {
        let session = self.sessions.sort_session(actor).await;
        let catalog = self.catalog.load();
        let overlays = self.overlays.snapshot();
        let record = session.plan_toggle(&catalog, &overlays, id)?;
        self.overlays.apply(record).await;
        self.sort_view(&session).await
    }

    /// Leave sort mode and return the refreshed top level.
    pub async fn sort_exit(&self, actor: ActorId) -> Vec<FolderLink> {
        let mut session = self.sessions.sort_session(actor).await;
        if session.exit() {
            info!(actor, "sort mode exited");
        }
        self.sessions.store_sort_session(actor, session).await;
        self.top_level().await
    }

    pub async fn sort_session(&self, actor: ActorId) -> SortSession {
        self.sessions.sort_session(actor).await
    }

    async fn sort_view(&self, session: &SortSession) -> Result<SortView, EngineError> {
        let catalog = self.catalog.load();
        let overlays = self.overlays.snapshot();
        Ok(session.view(&catalog, &overlays)?)
    }

    /// Point the actor's session at the scope a sort token was issued for.
    async fn align_sort_scope(
        &self,
        actor: ActorId,
        scope: Option<&str>,
    ) -> Result<(), EngineError> {
        let session = self.sessions.sort_session(actor).await;
        if session.scope()? != scope {
            self.sort_open(actor, scope).await?;
        }
        Ok(())
    }
}
