//! One generic collection manager, parameterised by entity kind.
//!
//! Fetches run as spawned tasks and report back over a channel; results are
//! only applied to the store from [`CollectionSync::poll`], so the store is
//! mutated from a single flow.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cache::{CacheSource, RequestKey, ResultCache};
use crate::gateway::api_types::{decode_page, Page};
use crate::gateway::{Gateway, GatewayError};
use crate::model::Entity;
use crate::store::{Applied, EntityStore, PageRequest, SyncState};

type PageResult<T> = (PageRequest, Result<Page<T>, GatewayError>);

/// Kind-independent controls over a collection, so callers can drive any of
/// the three collections through one handle.
pub trait CollectionControl {
  /// Load the first page if the collection was never loaded.
  fn open(&mut self) -> bool;

  fn load_first_page(&mut self) -> bool;

  fn load_next_page(&mut self) -> bool;

  fn retry(&mut self) -> bool;

  /// Discard the collection and load it again, superseding pending loads.
  fn reload(&mut self);

  /// Apply finished fetches. Returns `true` if anything changed.
  fn poll(&mut self) -> bool;

  fn state(&self) -> &SyncState;

  fn has_more(&self) -> bool;

  fn is_in_flight(&self) -> bool;

  fn len(&self) -> usize;

  fn version(&self) -> u64;
}

pub struct CollectionSync<T: Entity> {
  store: EntityStore<T>,
  gateway: Arc<dyn Gateway>,
  cache: ResultCache,
  sender: mpsc::UnboundedSender<PageResult<T>>,
  receiver: mpsc::UnboundedReceiver<PageResult<T>>,
}

impl<T: Entity> CollectionSync<T> {
  pub fn new(gateway: Arc<dyn Gateway>, cache: ResultCache, page_size: Option<usize>) -> Self {
    let (sender, receiver) = mpsc::unbounded_channel();
    Self {
      store: EntityStore::new(page_size),
      gateway,
      cache,
      sender,
      receiver,
    }
  }

  pub fn store(&self) -> &EntityStore<T> {
    &self.store
  }

  pub fn items(&self) -> &[T] {
    self.store.items()
  }

  pub fn get(&self, id: &str) -> Option<&T> {
    self.store.get(id)
  }

  fn spawn(&self, request: PageRequest) {
    let kind = T::KIND;
    let key = RequestKey::new(kind.list_action(), request.params());
    let gateway = Arc::clone(&self.gateway);
    let cache = self.cache.clone();
    let sender = self.sender.clone();

    debug!(request = %key.description(), generation = request.generation, "loading page");
    tokio::spawn(async move {
      let action = key.action();
      let outcome = cache
        .fetch(&key, || async {
          let value = gateway.call(action, key.params().clone()).await?;
          decode_page::<T>(action, kind.collection_key(), value)
        })
        .await;

      let outcome = match outcome {
        Ok(result) => {
          if result.source == CacheSource::Cache {
            debug!(request = %key.description(), "page served from cache");
          }
          Ok(result.data)
        }
        Err(e) => {
          warn!(request = %key.description(), "page load failed: {}", e);
          Err(e)
        }
      };

      // Ignore send errors - the collection may have been dropped
      let _ = sender.send((request, outcome));
    });
  }

  fn issue(&mut self, request: Option<PageRequest>) -> bool {
    match request {
      Some(request) => {
        self.spawn(request);
        true
      }
      None => false,
    }
  }
}

impl<T: Entity> CollectionControl for CollectionSync<T> {
  fn open(&mut self) -> bool {
    if *self.store.state() != SyncState::Empty || self.store.is_in_flight() {
      return false;
    }
    self.load_first_page()
  }

  fn load_first_page(&mut self) -> bool {
    let request = self.store.begin_first_page();
    self.issue(request)
  }

  fn load_next_page(&mut self) -> bool {
    let request = self.store.begin_next_page();
    self.issue(request)
  }

  fn retry(&mut self) -> bool {
    let request = self.store.begin_retry();
    self.issue(request)
  }

  fn reload(&mut self) {
    let request = self.store.restart();
    self.spawn(request);
  }

  fn poll(&mut self) -> bool {
    let mut changed = false;
    while let Ok((request, outcome)) = self.receiver.try_recv() {
      if self.store.apply(&request, outcome) == Applied::Updated {
        changed = true;
      }
    }
    changed
  }

  fn state(&self) -> &SyncState {
    self.store.state()
  }

  fn has_more(&self) -> bool {
    self.store.has_more()
  }

  fn is_in_flight(&self) -> bool {
    self.store.is_in_flight()
  }

  fn len(&self) -> usize {
    self.store.items().len()
  }

  fn version(&self) -> u64 {
    self.store.version()
  }
}
