/// Conversation session bookkeeping
///
/// A conversation can be ended by two independent triggers that may land in
/// quick succession: the participant explicitly leaving and the vendor's
/// shutdown webhook. `LeaveGuard` is the single-fire latch that keeps the
/// "conversation ended" work from running twice, and `SessionRegistry`
/// scopes one guard to each active conversation so concurrent conversations
/// never share state.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

/// Single-fire latch for the "conversation ended" callback.
///
/// Starts armed; the first `safe_call_on_leave` fires the callback and
/// records which source won, every later call is a no-op until `reset`.
#[derive(Debug, Default)]
pub struct LeaveGuard {
    fired: bool,
    fired_by: Option<String>,
}

impl LeaveGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke `callback` exactly once across any number of calls from any
    /// number of sources. Returns true when this call was the one that fired.
    pub fn safe_call_on_leave<F: FnOnce()>(&mut self, source: &str, callback: F) -> bool {
        if self.fired {
            debug!(
                "Ignoring duplicate leave from '{}' (already fired by '{}')",
                source,
                self.fired_by.as_deref().unwrap_or("unknown")
            );
            return false;
        }

        self.fired = true;
        self.fired_by = Some(source.to_string());
        callback();
        true
    }

    /// Whether the latch has already fired.
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Which source fired the latch, if any.
    pub fn fired_by(&self) -> Option<&str> {
        self.fired_by.as_deref()
    }

    /// Re-arm the latch for a new conversation in the same session.
    pub fn reset(&mut self) {
        self.fired = false;
        self.fired_by = None;
    }
}

/// One leave-guard per active conversation
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    guards: Arc<RwLock<HashMap<String, LeaveGuard>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the latch for `conversation_id`, creating it on first sight.
    /// Returns true when this call won the race and the caller should run
    /// the end-of-conversation work.
    pub async fn try_finish(&self, conversation_id: &str, source: &str) -> bool {
        let mut guards = self.guards.write().await;
        let guard = guards.entry(conversation_id.to_string()).or_default();
        guard.safe_call_on_leave(source, || {})
    }

    /// Drop the guard for a conversation that is fully finalized.
    pub async fn remove(&self, conversation_id: &str) {
        self.guards.write().await.remove(conversation_id);
    }

    /// Which source ended the conversation, if it has ended.
    pub async fn ended_by(&self, conversation_id: &str) -> Option<String> {
        self.guards
            .read()
            .await
            .get(conversation_id)
            .and_then(|g| g.fired_by().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_exactly_once() {
        let mut guard = LeaveGuard::new();
        let mut calls = 0;

        assert!(guard.safe_call_on_leave("user_click", || calls += 1));
        assert!(!guard.safe_call_on_leave("provider_event", || calls += 1));
        assert!(!guard.safe_call_on_leave("provider_event", || calls += 1));

        assert_eq!(calls, 1);
        assert_eq!(guard.fired_by(), Some("user_click"));
    }

    #[test]
    fn test_reset_rearms() {
        let mut guard = LeaveGuard::new();
        let mut calls = 0;

        guard.safe_call_on_leave("A", || calls += 1);
        guard.reset();
        assert!(!guard.has_fired());
        assert_eq!(guard.fired_by(), None);

        guard.safe_call_on_leave("B", || calls += 1);
        assert_eq!(calls, 2);
        assert_eq!(guard.fired_by(), Some("B"));
    }

    #[tokio::test]
    async fn test_registry_isolates_conversations() {
        let registry = SessionRegistry::new();

        assert!(registry.try_finish("conv-1", "user_click").await);
        assert!(!registry.try_finish("conv-1", "webhook").await);
        // A different conversation gets its own latch
        assert!(registry.try_finish("conv-2", "webhook").await);

        assert_eq!(registry.ended_by("conv-1").await.as_deref(), Some("user_click"));
        assert_eq!(registry.ended_by("conv-2").await.as_deref(), Some("webhook"));
    }

    #[tokio::test]
    async fn test_registry_remove_allows_reuse() {
        let registry = SessionRegistry::new();

        assert!(registry.try_finish("conv-1", "user_click").await);
        registry.remove("conv-1").await;
        // Fresh guard after removal behaves like a new session
        assert!(registry.try_finish("conv-1", "webhook").await);
    }
}
