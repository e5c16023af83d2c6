//! services/api/src/cook/store.rs
//!
//! In-memory session store. It exclusively owns every `CookSession`; callers
//! borrow one through a `SessionGuard`, which serialises all writers of a
//! single session and stamps `updated_at` whenever the session was mutated.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dinner_core::domain::{CookSession, TimelineStep};
use dinner_core::ports::{PortError, PortResult};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::info;
use uuid::Uuid;

/// Exclusive access to one session. Mutable access marks it dirty and the
/// guard refreshes `updated_at` when dropped.
pub struct SessionGuard {
    inner: OwnedMutexGuard<CookSession>,
    dirty: bool,
}

impl Deref for SessionGuard {
    type Target = CookSession;

    fn deref(&self) -> &CookSession {
        &self.inner
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut CookSession {
        self.dirty = true;
        &mut self.inner
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.dirty {
            self.inner.touch();
        }
    }
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<CookSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an idle session on its first step and returns its id.
    pub async fn create(
        &self,
        recipe_id: &str,
        user_id: &str,
        steps: Vec<TimelineStep>,
    ) -> PortResult<Uuid> {
        let session = CookSession::new(recipe_id, user_id, steps)?;
        let session_id = session.session_id();
        self.sessions
            .write()
            .await
            .insert(session_id, Arc::new(Mutex::new(session)));
        info!(%session_id, recipe_id, user_id, "Cooking session created.");
        Ok(session_id)
    }

    /// A point-in-time copy of the session.
    pub async fn get(&self, session_id: Uuid) -> PortResult<CookSession> {
        let guard = self.lock(session_id).await?;
        Ok(guard.clone())
    }

    /// Waits for exclusive access to a session.
    pub async fn lock(&self, session_id: Uuid) -> PortResult<SessionGuard> {
        let handle = self
            .sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or_else(|| not_found(session_id))?;
        let inner = handle.lock_owned().await;
        // The entry may have been removed while we waited for the lock.
        if !self.contains(session_id).await {
            return Err(not_found(session_id));
        }
        Ok(SessionGuard {
            inner,
            dirty: false,
        })
    }

    pub async fn contains(&self, session_id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&session_id)
    }

    /// Removes a session. Removing an absent session is not an error.
    pub async fn delete(&self, session_id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&session_id).is_some();
        if removed {
            info!(%session_id, "Cooking session removed.");
        }
        removed
    }

    /// Removes a session only if it is still untouched since `cutoff`, checked
    /// while holding its lock so a concurrent action keeps it alive.
    pub async fn delete_if_idle(&self, session_id: Uuid, cutoff: DateTime<Utc>) -> bool {
        let Ok(session) = self.lock(session_id).await else {
            return false;
        };
        if session.updated_at >= cutoff {
            return false;
        }
        let removed = self.delete(session_id).await;
        drop(session);
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Ids of sessions whose last mutation happened before `cutoff`.
    /// Sessions currently locked by a writer are skipped; they are in use.
    pub async fn idle_before(&self, cutoff: DateTime<Utc>) -> Vec<Uuid> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .filter_map(|(id, handle)| {
                let session = handle.try_lock().ok()?;
                (session.updated_at < cutoff).then_some(*id)
            })
            .collect()
    }
}

fn not_found(session_id: Uuid) -> PortError {
    PortError::NotFound(format!("Cooking session {} not found", session_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinner_core::domain::SessionStatus;
    use dinner_core::timeline::placeholder_timeline;

    #[tokio::test]
    async fn create_then_get_returns_idle_session() {
        let store = SessionStore::new();
        let id = store.create("r1", "u1", placeholder_timeline()).await.unwrap();
        let session = store.get(id).await.unwrap();
        assert_eq!(session.status, SessionStatus::Idle);
        assert_eq!(session.current_step_index, 0);
        assert_eq!(session.timer_remaining_seconds, 0);
    }

    #[tokio::test]
    async fn create_rejects_empty_timeline() {
        let store = SessionStore::new();
        let err = store.create("r1", "u1", Vec::new()).await.unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = SessionStore::new();
        let id = store.create("r1", "u1", placeholder_timeline()).await.unwrap();
        assert!(store.delete(id).await);
        assert!(!store.delete(id).await);
        assert!(matches!(store.get(id).await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn mutation_through_guard_refreshes_updated_at() {
        let store = SessionStore::new();
        let id = store.create("r1", "u1", placeholder_timeline()).await.unwrap();
        let before = store.get(id).await.unwrap().updated_at;

        {
            let guard = store.lock(id).await.unwrap();
            assert_eq!(guard.current_step_index, 0);
        }
        assert_eq!(store.get(id).await.unwrap().updated_at, before);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        {
            let mut guard = store.lock(id).await.unwrap();
            guard.current_step_index = 1;
        }
        assert!(store.get(id).await.unwrap().updated_at > before);
    }

    #[tokio::test]
    async fn idle_before_lists_stale_sessions() {
        let store = SessionStore::new();
        let id = store.create("r1", "u1", placeholder_timeline()).await.unwrap();
        let future = Utc::now() + chrono::Duration::seconds(10);
        assert_eq!(store.idle_before(future).await, vec![id]);
        let past = Utc::now() - chrono::Duration::seconds(10);
        assert!(store.idle_before(past).await.is_empty());
    }

    #[tokio::test]
    async fn session_touched_after_the_scan_is_kept() {
        let store = SessionStore::new();
        let id = store.create("r1", "u1", placeholder_timeline()).await.unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let cutoff = Utc::now();
        assert_eq!(store.idle_before(cutoff).await, vec![id]);

        std::thread::sleep(std::time::Duration::from_millis(5));
        store.lock(id).await.unwrap().status = SessionStatus::Cooking;

        assert!(!store.delete_if_idle(id, cutoff).await);
        assert!(store.contains(id).await);

        let later = Utc::now() + chrono::Duration::seconds(1);
        assert!(store.delete_if_idle(id, later).await);
        assert!(!store.contains(id).await);
        assert!(!store.delete_if_idle(id, later).await);
    }
}
