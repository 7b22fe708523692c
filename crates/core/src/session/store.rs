//! Keyed store of interactive sessions.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::types::SessionState;
use crate::messaging::UserId;

/// In-memory session records keyed by user, plus one lock per user.
///
/// Holders of a user's lock are the only readers and writers of that
/// user's record; different users never contend.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, SessionState>>,
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive handling of `user`'s messages.
    ///
    /// Locks nobody holds or waits on are dropped on the way in, so the map
    /// only keeps entries for users with a message in flight.
    pub async fn lock_user(&self, user: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // A held guard or a waiter owns a clone, so a count of one is idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of per-user locks currently tracked.
    pub async fn tracked_locks(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn get(&self, user: UserId) -> Option<SessionState> {
        self.sessions.read().await.get(&user).cloned()
    }

    /// Stores `state`, returning the record it replaced.
    pub async fn insert(&self, state: SessionState) -> Option<SessionState> {
        self.sessions.write().await.insert(state.user_id, state)
    }

    pub async fn remove(&self, user: UserId) -> Option<SessionState> {
        self.sessions.write().await.remove(&user)
    }

    pub async fn contains(&self, user: UserId) -> bool {
        self.sessions.read().await.contains_key(&user)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
