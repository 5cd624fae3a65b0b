//! Per-conversation navigation state and per-actor sort sessions.

use std::collections::HashMap;

use tokio::sync::RwLock;

use storefront_core::admin::SortSession;
use storefront_core::render::NavigationState;

pub type ConversationId = i64;
pub type ActorId = i64;

#[derive(Default)]
pub struct SessionRegistry {
    navigation: RwLock<HashMap<ConversationId, NavigationState>>,
    sorting: RwLock<HashMap<ActorId, SortSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn navigation(&self, conversation: ConversationId) -> Option<NavigationState> {
        self.navigation.read().await.get(&conversation).cloned()
    }

    pub async fn set_navigation(&self, conversation: ConversationId, state: NavigationState) {
        self.navigation.write().await.insert(conversation, state);
    }

    /// Current sort session of `actor`; idle when none exists.
    pub async fn sort_session(&self, actor: ActorId) -> SortSession {
        self.sorting
            .read()
            .await
            .get(&actor)
            .cloned()
            .unwrap_or_default()
    }

    /// Store `session`; an idle session is dropped.
    pub async fn store_sort_session(&self, actor: ActorId, session: SortSession) {
        let mut sorting = self.sorting.write().await;
        if session.is_active() {
            sorting.insert(actor, session);
        } else {
            sorting.remove(&actor);
        }
    }

    pub async fn active_sorters(&self) -> usize {
        self.sorting.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_sessions_are_dropped() {
        tokio_test::block_on(async {
            let sessions = SessionRegistry::new();
            let mut session = sessions.sort_session(7).await;
            assert!(!session.is_active());

            session.enter();
            sessions.store_sort_session(7, session.clone()).await;
            assert!(sessions.sort_session(7).await.is_active());
            assert_eq!(sessions.active_sorters().await, 1);

            session.exit();
            sessions.store_sort_session(7, session).await;
            assert_eq!(sessions.active_sorters().await, 0);
        });
    }

    #[test]
    fn test_navigation_state_is_per_conversation() {
        tokio_test::block_on(async {
            let sessions = SessionRegistry::new();
            sessions
                .set_navigation(
                    1,
                    NavigationState {
                        scope: Some("soups".to_string()),
                        page: 2,
                    },
                )
                .await;
            assert_eq!(sessions.navigation(1).await.unwrap().page, 2);
            assert!(sessions.navigation(2).await.is_none());
        });
    }
}
