//! Per-user request serialization
//!
//! Requests from the same user are handled one at a time so that each sees
//! the turn written by the previous one. Different users never wait on each
//! other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;

type UserLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, UserLock>>,
}

impl UserLocks {
    fn map(&self) -> MutexGuard<'_, HashMap<String, UserLock>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for exclusive access to `user_id`'s conversation
    pub async fn acquire(&self, user_id: &str) -> UserGuard<'_> {
        let lock = Arc::clone(self.map().entry(user_id.to_string()).or_default());
        let guard = lock.lock_owned().await;
        UserGuard {
            locks: self,
            user_id: user_id.to_string(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub fn tracked_users(&self) -> usize {
        self.map().len()
    }
}

/// Held for the duration of one request. The entry is removed once no
/// request holds or waits on it.
pub struct UserGuard<'a> {
    locks: &'a UserLocks,
    user_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self.locks.map();
        if map
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.user_id);
        }
    }
}
