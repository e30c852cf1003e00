//! Cache layer that serves fresh responses and fetches through on a miss.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::storage::{CacheEntry, CacheStorage, MemoryStorage, NoopStorage};
use super::traits::{CacheResult, RequestKey, Signature};
use crate::config::CacheConfig;

/// Default time-to-live for cached responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Time-boxed cache of read responses, keyed by request signature.
///
/// Entries older than the TTL are treated as absent and replaced by the next
/// successful fetch; nothing is swept in the background. Clones share the
/// same storage and epoch.
pub struct ResultCache {
  storage: Arc<dyn CacheStorage>,
  /// Bumped by every `clear`. Fetches started in an older epoch don't store.
  epoch: Arc<AtomicU64>,
  /// How long a stored response is served without refetching
  ttl: Duration,
}

impl ResultCache {
  /// Create a new cache with the given storage backend.
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
      epoch: Arc::new(AtomicU64::new(0)),
      ttl: DEFAULT_TTL,
    }
  }

  pub fn in_memory() -> Self {
    Self::new(MemoryStorage::new())
  }

  /// A cache that never serves anything.
  pub fn disabled() -> Self {
    Self::new(NoopStorage)
  }

  pub fn from_config(config: &CacheConfig) -> Self {
    if config.enabled {
      Self::in_memory().with_ttl(config.ttl())
    } else {
      Self::disabled()
    }
  }

  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  fn is_fresh(&self, stored_at: Instant) -> bool {
    stored_at.elapsed() < self.ttl
  }

  /// Look up a fresh entry.
  pub fn get(&self, signature: &Signature) -> Option<CacheEntry> {
    self
      .storage
      .get(signature)
      .filter(|entry| self.is_fresh(entry.stored_at))
  }

  pub fn put<T: Serialize>(&self, signature: Signature, data: &T) {
    match serde_json::to_value(data) {
      Ok(value) => self.storage.put(
        signature,
        CacheEntry {
          value,
          stored_at: Instant::now(),
        },
      ),
      Err(e) => warn!(%signature, "not caching unserializable response: {}", e),
    }
  }

  /// Drop every entry, whatever request produced it.
  pub fn clear(&self) {
    let dropped = self.storage.len();
    self.epoch.fetch_add(1, Ordering::SeqCst);
    self.storage.clear();
    debug!(dropped, "cache cleared");
  }

  pub fn len(&self) -> usize {
    self.storage.len()
  }

  /// Serve `key` from cache when fresh, otherwise run `fetcher` and store
  /// its result. Failed fetches are never cached, and neither are results of
  /// fetches that were overtaken by a `clear`.
  pub async fn fetch<T, E, F, Fut>(&self, key: &RequestKey, fetcher: F) -> Result<CacheResult<T>, E>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let signature = key.signature();

    if let Some(entry) = self.get(&signature) {
      match serde_json::from_value(entry.value) {
        Ok(data) => {
          debug!(request = %key.description(), "cache hit");
          return Ok(CacheResult::from_cache(data, entry.stored_at));
        }
        Err(e) => warn!(request = %key.description(), "discarding unreadable cache entry: {}", e),
      }
    }

    debug!(request = %key.description(), "cache miss");
    let started = self.epoch.load(Ordering::SeqCst);
    let data = fetcher().await?;
    if self.epoch.load(Ordering::SeqCst) == started {
      self.put(signature, &data);
    } else {
      debug!(request = %key.description(), "cache cleared during fetch, not storing");
    }
    Ok(CacheResult::from_network(data))
  }
}

impl Clone for ResultCache {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      epoch: Arc::clone(&self.epoch),
      ttl: self.ttl,
    }
  }
}
