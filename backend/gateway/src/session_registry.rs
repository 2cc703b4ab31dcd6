//! Active browser session registry.
//!
//! Maps the session id carried in the page's hidden form field to its
//! controller. Sessions live in memory only and are pruned once idle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use finsight_core::TriggerPolicy;

use crate::controller::{Effect, SessionController, SessionEvent, SessionState};

pub type SessionId = String;

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    controller: SessionController,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    trigger: TriggerPolicy,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(trigger: TriggerPolicy) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            trigger,
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    pub fn trigger(&self) -> TriggerPolicy {
        self.trigger
    }

    /// Return the given id if it names a live session, otherwise open a new one.
    pub async fn resolve(&self, requested: Option<&str>) -> SessionId {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.prune_locked(&mut sessions, now);

        if let Some(id) = requested.filter(|id| sessions.contains_key(*id)) {
            if let Some(entry) = sessions.get_mut(id) {
                entry.last_seen = now;
            }
            return id.to_string();
        }

        let id = uuid::Uuid::new_v4().to_string();
        sessions.insert(
            id.clone(),
            SessionEntry {
                controller: SessionController::new(self.trigger),
                last_seen: now,
            },
        );
        debug!(session = %id, "Opened session");
        id
    }

    /// Feed an event to a session's controller. Events for sessions that no
    /// longer exist are dropped.
    pub async fn dispatch(&self, session_id: &str, event: SessionEvent) -> Effect {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions.get_mut(session_id) else {
            warn!(session = %session_id, "Dropping event for unknown session");
            return Effect::None;
        };
        entry.last_seen = Instant::now();
        entry.controller.handle(event)
    }

    /// Current state of a session, or `Idle` if it does not exist.
    pub async fn snapshot(&self, session_id: &str) -> SessionState {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|entry| entry.controller.state().clone())
            .unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than the timeout, as of `now`.
    pub async fn prune_idle(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        self.prune_locked(&mut sessions, now)
    }

    fn prune_locked(&self, sessions: &mut HashMap<SessionId, SessionEntry>, now: Instant) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < self.idle_timeout);
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Pruned idle sessions");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_reuses_known_ids() {
        let registry = SessionRegistry::new(TriggerPolicy::Manual);
        let id = registry.resolve(None).await;

        assert_eq!(registry.resolve(Some(&id)).await, id);
        assert_ne!(registry.resolve(Some("forged")).await, "forged");
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn unknown_session_is_idle() {
        let registry = SessionRegistry::new(TriggerPolicy::Automatic);
        assert!(matches!(registry.snapshot("nobody").await, SessionState::Idle));
    }

    #[tokio::test]
    async fn idle_sessions_are_pruned() {
        let registry = SessionRegistry::new(TriggerPolicy::Manual);
        registry.resolve(None).await;

        assert_eq!(registry.prune_idle(Instant::now()).await, 0);
        assert_eq!(registry.prune_idle(Instant::now() + IDLE_TIMEOUT).await, 1);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn dispatch_request_on_idle_session_does_nothing() {
        let registry = SessionRegistry::new(TriggerPolicy::Manual);
        let id = registry.resolve(None).await;

        let effect = registry.dispatch(&id, SessionEvent::AnalysisRequested).await;
        assert!(matches!(effect, Effect::None));
        assert!(matches!(registry.snapshot(&id).await, SessionState::Idle));
    }

    #[tokio::test]
    async fn dispatch_to_unknown_session_is_dropped() {
        let registry = SessionRegistry::new(TriggerPolicy::Automatic);

        let effect = registry.dispatch("forged", SessionEvent::AnalysisRequested).await;

        assert!(matches!(effect, Effect::None));
        assert_eq!(registry.len().await, 0);
    }
}
