//! Session storage
//!
//! An in-memory store keyed by session key with TTL-based expiry. The trait
//! keeps the door open for persistent backends without touching callers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::SessionContext;
use crate::error::Result;

/// Session store trait for abstracting storage backends
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a session by key
    async fn get(&self, session_key: &str) -> Result<Option<SessionContext>>;

    /// Save a session
    async fn save(&self, session: &SessionContext) -> Result<()>;

    /// Delete a session
    async fn delete(&self, session_key: &str) -> Result<bool>;

    /// Get session count
    async fn count(&self) -> Result<usize>;

    /// Cleanup expired sessions
    async fn cleanup_expired(&self) -> Result<usize>;
}

/// In-memory session store
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionContext>>>,
    /// Session TTL in hours
    ttl_hours: u64,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    /// Create a new store with the default 24h TTL
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl_hours: 24,
        }
    }

    /// Create with a custom TTL
    #[must_use]
    pub fn with_ttl_hours(ttl_hours: u64) -> Self {
        Self {
            ttl_hours,
            ..Self::new()
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_key: &str) -> Result<Option<SessionContext>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_key).cloned())
    }

    async fn save(&self, session: &SessionContext) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.session_key.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_key: &str) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(session_key).is_some())
    }

    async fn count(&self) -> Result<usize> {
        let sessions = self.sessions.read().await;
        Ok(sessions.len())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::hours(self.ttl_hours as i64);
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_activity > cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "Expired sessions cleaned up");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_session_store() {
        let store = MemorySessionStore::new();
        assert_eq!(store.count().await.unwrap(), 0);

        let mut session = SessionContext::new("user:alice");
        session.add_user_query("Hello");
        store.save(&session).await.unwrap();

        let loaded = store.get("user:alice").await.unwrap().unwrap();
        assert_eq!(loaded.turn_count(), 1);
        assert_eq!(store.count().await.unwrap(), 1);

        assert!(store.delete("user:alice").await.unwrap());
        assert!(store.get("user:alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = MemorySessionStore::with_ttl_hours(0);
        let mut session = SessionContext::new("user:old");
        session.last_activity = Utc::now() - chrono::Duration::minutes(5);
        store.save(&session).await.unwrap();

        let removed = store.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
