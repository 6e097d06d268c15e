//! Per-event mutation locks for the audio store.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError, Weak},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Prune dead entries once the map grows past this many events.
const PRUNE_THRESHOLD: usize = 64;

/// Hands out one async mutex per event id. Entries are held weakly, so an
/// event's lock disappears once no operation on it is in flight.
#[derive(Default)]
pub struct EventLocks {
  locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl EventLocks {
  /// Wait until no other mutation of `event_id` is in flight.
  pub async fn lock(&self, event_id: &str) -> OwnedMutexGuard<()> {
    self.acquire(event_id).lock_owned().await
  }

  fn acquire(&self, event_id: &str) -> Arc<AsyncMutex<()>> {
    // The map only holds weak pointers, so a poisoned guard is still usable.
    let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

    if locks.len() > PRUNE_THRESHOLD {
      locks.retain(|_, weak| weak.strong_count() > 0);
    }

    if let Some(existing) = locks.get(event_id).and_then(Weak::upgrade) {
      return existing;
    }

    let lock = Arc::new(AsyncMutex::new(()));
    locks.insert(event_id.to_owned(), Arc::downgrade(&lock));
    lock
  }

  #[cfg(test)]
  fn live(&self) -> usize {
    let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
    locks.values().filter(|weak| weak.strong_count() > 0).count()
  }
}
