//! Cache storage trait and the in-memory implementation.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

use super::traits::Signature;

/// A stored response and when it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub value: Value,
  pub stored_at: Instant,
}

/// Trait for cache storage backends.
///
/// Backends only keep entries; freshness is decided by the cache layer.
pub trait CacheStorage: Send + Sync {
  fn get(&self, signature: &Signature) -> Option<CacheEntry>;

  /// Insert or replace the entry for `signature`.
  fn put(&self, signature: Signature, entry: CacheEntry);

  /// Drop every entry.
  fn clear(&self);

  fn len(&self) -> usize;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _signature: &Signature) -> Option<CacheEntry> {
    None // Always miss
  }

  fn put(&self, _signature: Signature, _entry: CacheEntry) {}

  fn clear(&self) {}

  fn len(&self) -> usize {
    0
  }
}

/// Process-wide map of responses, shared by every read.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<Signature, CacheEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  // Entries are replaced whole, so the map stays consistent even if the lock was poisoned.
  fn entries(&self) -> MutexGuard<'_, HashMap<Signature, CacheEntry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, signature: &Signature) -> Option<CacheEntry> {
    self.entries().get(signature).cloned()
  }

  fn put(&self, signature: Signature, entry: CacheEntry) {
    self.entries().insert(signature, entry);
  }

  fn clear(&self) {
    self.entries().clear();
  }

  fn len(&self) -> usize {
    self.entries().len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::traits::RequestKey;
  use crate::gateway::{Action, Params};
  use serde_json::json;

  fn signature(action: Action) -> Signature {
    RequestKey::new(action, Params::new()).signature()
  }

  fn entry(value: Value) -> CacheEntry {
    CacheEntry {
      value,
      stored_at: Instant::now(),
    }
  }

  #[test]
  fn test_put_replaces_entry() {
    let storage = MemoryStorage::new();
    storage.put(signature(Action::GetProducts), entry(json!([1])));
    storage.put(signature(Action::GetProducts), entry(json!([1, 2])));

    assert_eq!(storage.len(), 1);
    assert_eq!(
      storage.get(&signature(Action::GetProducts)).unwrap().value,
      json!([1, 2])
    );
  }

  #[test]
  fn test_clear_drops_everything() {
    let storage = MemoryStorage::new();
    storage.put(signature(Action::GetProducts), entry(json!([])));
    storage.put(signature(Action::GetCustomers), entry(json!([])));

    storage.clear();

    assert_eq!(storage.len(), 0);
    assert!(storage.get(&signature(Action::GetCustomers)).is_none());
  }

  #[test]
  fn test_noop_never_stores() {
    let storage = NoopStorage;
    storage.put(signature(Action::GetProducts), entry(json!([])));
    assert!(storage.get(&signature(Action::GetProducts)).is_none());
    assert_eq!(storage.len(), 0);
  }
}
