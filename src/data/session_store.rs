use crate::domain::repository::SessionStore;
use crate::domain::user::Session;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, session: Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        // Drop whatever has lapsed while we hold the lock anyway
        let now = Utc::now();
        sessions.retain(|_, s| !s.is_expired(now));
        debug!(session_id = %session.id, user_id = %session.user_id, "Session created");
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn find_session(&self, id: &str) -> Result<Option<Session>> {
        let session = self.sessions.read().await.get(id).cloned();
        match session {
            Some(s) if s.is_expired(Utc::now()) => {
                trace!(session_id = id, "Session expired");
                self.sessions.write().await.remove(id);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn remove_session(&self, id: &str) -> Result<()> {
        if self.sessions.write().await.remove(id).is_some() {
            debug!(session_id = id, "Session removed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(id: &str, ttl_secs: i64) -> Session {
        Session {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            expires_at: Utc::now() + Duration::seconds(ttl_secs),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_session() {
        let store = InMemorySessionStore::new();
        store.create_session(session("s1", 60)).await.unwrap();

        let found = store.find_session("s1").await.unwrap().unwrap();
        assert_eq!(found.user_id, "user-1");
        assert!(store.find_session("s2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_not_returned() {
        let store = InMemorySessionStore::new();
        store.create_session(session("old", -1)).await.unwrap();

        assert!(store.find_session("old").await.unwrap().is_none());
        assert!(store.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_session() {
        let store = InMemorySessionStore::new();
        store.create_session(session("s1", 60)).await.unwrap();
        store.remove_session("s1").await.unwrap();

        assert!(store.find_session("s1").await.unwrap().is_none());
        // Removing twice is harmless
        store.remove_session("s1").await.unwrap();
    }
}
