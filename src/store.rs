//! In-memory mirror of one entity collection plus its pagination cursor.
//!
//! The store never talks to the network. Loads are split in two halves:
//! `begin_*` decides whether a request should be issued and returns it,
//! `apply` folds the response back in. Everything here is synchronous so the
//! state machine can be tested without a runtime.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::gateway::api_types::Page;
use crate::gateway::{GatewayError, Params};
use crate::model::Entity;

/// Load state of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
  /// Never loaded (or discarded after a mutation)
  Empty,
  /// Fetching the first page
  Loading,
  Loaded,
  /// Fetching a further page; loaded items stay visible
  LoadingMore,
  /// The last fetch failed; loaded items stay visible
  LoadFailed(String),
}

impl SyncState {
  pub fn is_loading(&self) -> bool {
    matches!(self, SyncState::Loading | SyncState::LoadingMore)
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      SyncState::LoadFailed(message) => Some(message),
      _ => None,
    }
  }
}

/// Offset pagination position. `offset` counts server rows already loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
  pub offset: usize,
  /// `None` fetches the whole collection in one request
  pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
  First,
  Next,
}

/// A page fetch handed out by the store and returned with its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
  pub generation: u64,
  pub kind: PageKind,
  pub offset: usize,
  pub limit: Option<usize>,
}

impl PageRequest {
  /// Request parameters. Unpaged collections send none.
  pub fn params(&self) -> Params {
    let mut params = Params::new();
    if let Some(limit) = self.limit {
      params.insert("offset".into(), Value::from(self.offset));
      params.insert("limit".into(), Value::from(limit));
    }
    params
  }
}

/// What `apply` did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
  Updated,
  /// The response belonged to a superseded generation and was dropped
  Stale,
}

#[derive(Debug)]
pub struct EntityStore<T> {
  items: Vec<T>,
  cursor: Cursor,
  has_more: bool,
  state: SyncState,
  /// Bumped whenever a first-page load starts; older responses are stale
  generation: u64,
  in_flight: bool,
  last_failed: Option<PageKind>,
  /// Bumped on every visible change, for cheap redraw checks
  version: u64,
}

impl<T: Entity> EntityStore<T> {
  pub fn new(page_size: Option<usize>) -> Self {
    Self {
      items: Vec::new(),
      cursor: Cursor {
        offset: 0,
        page_size,
      },
      has_more: false,
      state: SyncState::Empty,
      generation: 0,
      in_flight: false,
      last_failed: None,
      version: 0,
    }
  }

  pub fn items(&self) -> &[T] {
    &self.items
  }

  pub fn get(&self, id: &str) -> Option<&T> {
    self.items.iter().find(|item| item.id() == id)
  }

  pub fn state(&self) -> &SyncState {
    &self.state
  }

  pub fn cursor(&self) -> Cursor {
    self.cursor
  }

  pub fn has_more(&self) -> bool {
    self.has_more
  }

  pub fn is_in_flight(&self) -> bool {
    self.in_flight
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn version(&self) -> u64 {
    self.version
  }

  /// Start a fresh load from offset zero. No-op while a load is pending.
  pub fn begin_first_page(&mut self) -> Option<PageRequest> {
    if self.in_flight {
      debug!(kind = ?T::KIND, "load already in flight, ignoring first page request");
      return None;
    }
    self.generation += 1;
    Some(self.start(PageKind::First, SyncState::Loading, 0))
  }

  /// Continue after the loaded items. No-op while a load is pending or when
  /// the server has nothing more.
  pub fn begin_next_page(&mut self) -> Option<PageRequest> {
    if self.in_flight || !self.has_more || self.cursor.page_size.is_none() {
      return None;
    }
    let offset = self.cursor.offset;
    Some(self.start(PageKind::Next, SyncState::LoadingMore, offset))
  }

  /// Re-issue whichever load failed last.
  pub fn begin_retry(&mut self) -> Option<PageRequest> {
    match self.last_failed {
      Some(PageKind::Next) => {
        let offset = self.cursor.offset;
        if self.in_flight {
          return None;
        }
        Some(self.start(PageKind::Next, SyncState::LoadingMore, offset))
      }
      _ => self.begin_first_page(),
    }
  }

  /// Drop everything and start over, superseding any pending load.
  pub fn restart(&mut self) -> PageRequest {
    self.items.clear();
    self.cursor.offset = 0;
    self.has_more = false;
    self.last_failed = None;
    self.in_flight = false;
    self.generation += 1;
    self.start(PageKind::First, SyncState::Loading, 0)
  }

  fn start(&mut self, kind: PageKind, state: SyncState, offset: usize) -> PageRequest {
    self.in_flight = true;
    self.state = state;
    self.version += 1;
    PageRequest {
      generation: self.generation,
      kind,
      offset,
      limit: self.cursor.page_size,
    }
  }

  /// Fold a response into the collection.
  ///
  /// A failure keeps whatever was loaded before and moves to `LoadFailed`.
  pub fn apply(&mut self, request: &PageRequest, outcome: Result<Page<T>, GatewayError>) -> Applied {
    if request.generation != self.generation || !self.in_flight {
      debug!(
        kind = ?T::KIND,
        generation = request.generation,
        current = self.generation,
        "discarding stale response"
      );
      return Applied::Stale;
    }
    self.in_flight = false;
    self.version += 1;

    let page = match outcome {
      Ok(page) => page,
      Err(e) => {
        self.state = SyncState::LoadFailed(e.to_string());
        self.last_failed = Some(request.kind);
        return Applied::Updated;
      }
    };

    let fetched = page.items.len();
    match request.kind {
      PageKind::First => {
        self.items = page.items;
        self.cursor.offset = fetched;
      }
      PageKind::Next => {
        // Rows inserted upstream between pages shift offsets; skip repeats
        let seen: HashSet<String> = self.items.iter().map(|item| item.id().to_string()).collect();
        self
          .items
          .extend(page.items.into_iter().filter(|item| !seen.contains(item.id())));
        self.cursor.offset += fetched;
      }
    }

    self.has_more = match (page.has_more, request.limit) {
      _ if request.kind == PageKind::Next && fetched == 0 => false,
      (Some(flag), _) => flag,
      (None, Some(limit)) => fetched == limit,
      (None, None) => false,
    };
    self.state = SyncState::Loaded;
    self.last_failed = None;
    Applied::Updated
  }
}
