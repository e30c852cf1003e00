//! Session state: the three synced collections, the shared result cache and
//! the outcome of mutations.
//!
//! `ViewSync` is created at session start and torn down with
//! [`ViewSync::close`]. All store updates happen in [`ViewSync::poll`], which
//! the event loop calls on every tick.

mod collection;

pub use collection::{CollectionControl, CollectionSync};

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::config::PaginationConfig;
use crate::gateway::api_types::{decode_mutation, MutationAck};
use crate::gateway::{Action, Gateway, GatewayError, Params};
use crate::model::{new_id, Customer, Entity, EntityKind, Product, Quotation, ValidationError};
use crate::store::SyncState;

/// How long a notice stays on the status line.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Info,
  Error,
}

/// Transient user-visible message.
#[derive(Debug, Clone)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
  raised_at: Instant,
}

impl Notice {
  pub fn is_expired(&self) -> bool {
    self.raised_at.elapsed() >= NOTICE_TTL
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
  Save,
  Delete,
}

impl MutationOp {
  fn past_tense(self) -> &'static str {
    match self {
      MutationOp::Save => "saved",
      MutationOp::Delete => "deleted",
    }
  }
}

#[derive(Debug)]
struct MutationOutcome {
  kind: EntityKind,
  op: MutationOp,
  label: String,
  result: Result<MutationAck, GatewayError>,
}

pub struct ViewSync {
  gateway: Arc<dyn Gateway>,
  cache: ResultCache,
  quotations: CollectionSync<Quotation>,
  products: CollectionSync<Product>,
  customers: CollectionSync<Customer>,
  outcome_tx: mpsc::UnboundedSender<MutationOutcome>,
  outcome_rx: mpsc::UnboundedReceiver<MutationOutcome>,
  pending_mutations: usize,
  notices: Vec<Notice>,
}

impl ViewSync {
  pub fn new(gateway: Arc<dyn Gateway>, cache: ResultCache, pagination: &PaginationConfig) -> Self {
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
    Self {
      quotations: CollectionSync::new(
        Arc::clone(&gateway),
        cache.clone(),
        pagination.page_size(EntityKind::Quotation),
      ),
      products: CollectionSync::new(
        Arc::clone(&gateway),
        cache.clone(),
        pagination.page_size(EntityKind::Product),
      ),
      customers: CollectionSync::new(
        Arc::clone(&gateway),
        cache.clone(),
        pagination.page_size(EntityKind::Customer),
      ),
      gateway,
      cache,
      outcome_tx,
      outcome_rx,
      pending_mutations: 0,
      notices: Vec::new(),
    }
  }

  pub fn quotations(&self) -> &CollectionSync<Quotation> {
    &self.quotations
  }

  pub fn products(&self) -> &CollectionSync<Product> {
    &self.products
  }

  pub fn customers(&self) -> &CollectionSync<Customer> {
    &self.customers
  }

  pub fn cache(&self) -> &ResultCache {
    &self.cache
  }

  pub fn collection(&self, kind: EntityKind) -> &dyn CollectionControl {
    match kind {
      EntityKind::Quotation => &self.quotations,
      EntityKind::Product => &self.products,
      EntityKind::Customer => &self.customers,
    }
  }

  fn collection_mut(&mut self, kind: EntityKind) -> &mut dyn CollectionControl {
    match kind {
      EntityKind::Quotation => &mut self.quotations,
      EntityKind::Product => &mut self.products,
      EntityKind::Customer => &mut self.customers,
    }
  }

  /// First access to a section. Quotations also need products and
  /// customers to build new quotations.
  pub fn open(&mut self, kind: EntityKind) {
    self.collection_mut(kind).open();
    if kind == EntityKind::Quotation {
      self.products.open();
      self.customers.open();
    }
  }

  pub fn load_first_page(&mut self, kind: EntityKind) -> bool {
    self.collection_mut(kind).load_first_page()
  }

  pub fn load_next_page(&mut self, kind: EntityKind) -> bool {
    self.collection_mut(kind).load_next_page()
  }

  pub fn retry(&mut self, kind: EntityKind) -> bool {
    self.collection_mut(kind).retry()
  }

  pub fn reload(&mut self, kind: EntityKind) {
    self.collection_mut(kind).reload();
  }

  /// Drop every cached result and reload `kind` from the endpoint.
  pub fn refresh(&mut self, kind: EntityKind) {
    self.cache.clear();
    self.reload(kind);
  }

  /// Validate and submit `entity`. Returns the id it was saved under.
  ///
  /// Records without an id get a fresh one here; the gateway is never
  /// reached when validation fails.
  pub fn save<T: Entity>(&mut self, mut entity: T) -> Result<String, ValidationError> {
    entity.prepare();
    entity.validate()?;
    if entity.id().is_empty() {
      entity.set_id(new_id());
    }

    let params = match serde_json::to_value(&entity) {
      Ok(Value::Object(params)) => params,
      Ok(_) => return Err(ValidationError::invalid("record", "not a field map")),
      Err(e) => return Err(ValidationError::invalid("record", e.to_string())),
    };

    let id = entity.id().to_string();
    let label = format!("{} {}", T::KIND.label(), entity.display_name());
    self.spawn_mutation(T::KIND, MutationOp::Save, label, params);
    Ok(id)
  }

  /// Submit a delete for `id`.
  pub fn delete(&mut self, kind: EntityKind, id: &str) {
    let name = match kind {
      EntityKind::Quotation => self.quotations.get(id).map(|q| q.display_name().to_string()),
      EntityKind::Product => self.products.get(id).map(|p| p.display_name().to_string()),
      EntityKind::Customer => self.customers.get(id).map(|c| c.display_name().to_string()),
    };
    let label = format!("{} {}", kind.label(), name.unwrap_or_else(|| id.to_string()));

    let mut params = Params::new();
    params.insert("id".into(), Value::from(id));
    self.spawn_mutation(kind, MutationOp::Delete, label, params);
  }

  fn spawn_mutation(&mut self, kind: EntityKind, op: MutationOp, label: String, params: Params) {
    let action: Action = match op {
      MutationOp::Save => kind.save_action(),
      MutationOp::Delete => kind.delete_action(),
    };
    let gateway = Arc::clone(&self.gateway);
    let sender = self.outcome_tx.clone();
    self.pending_mutations += 1;

    debug!(%action, %label, "submitting mutation");
    tokio::spawn(async move {
      let result = match gateway.call(action, params).await {
        Ok(value) => decode_mutation(action, value),
        Err(e) => Err(e),
      };
      let _ = sender.send(MutationOutcome {
        kind,
        op,
        label,
        result,
      });
    });
  }

  /// Apply finished mutations and page loads. Returns `true` if anything
  /// visible changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    while let Ok(outcome) = self.outcome_rx.try_recv() {
      self.pending_mutations = self.pending_mutations.saturating_sub(1);
      changed = true;
      match outcome.result {
        Ok(ack) => {
          info!(kind = ?outcome.kind, id = ?ack.id, "{} {}", outcome.label, outcome.op.past_tense());
          self.cache.clear();
          self.reload(outcome.kind);
          self.notify(
            NoticeLevel::Info,
            format!("{} {}", outcome.label, outcome.op.past_tense()),
          );
        }
        Err(e) => {
          warn!(kind = ?outcome.kind, "mutation failed: {}", e);
          self.notify(NoticeLevel::Error, e.to_string());
        }
      }
    }

    for kind in EntityKind::ALL {
      let collection = self.collection_mut(kind);
      if !collection.poll() {
        continue;
      }
      changed = true;
      let failure = collection
        .state()
        .error()
        .map(|e| format!("Loading {} failed: {}", kind.plural().to_lowercase(), e));
      if let Some(message) = failure {
        self.notify(NoticeLevel::Error, message);
      }
    }

    changed
  }

  /// Whether any load or mutation is outstanding.
  pub fn is_busy(&self) -> bool {
    self.pending_mutations > 0
      || EntityKind::ALL
        .iter()
        .any(|kind| self.collection(*kind).is_in_flight())
  }

  pub fn pending_mutations(&self) -> usize {
    self.pending_mutations
  }

  pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
    self.notices.push(Notice {
      level,
      message: message.into(),
      raised_at: Instant::now(),
    });
  }

  pub fn notices(&self) -> &[Notice] {
    &self.notices
  }

  /// The most recent notice that has not expired yet.
  pub fn latest_notice(&self) -> Option<&Notice> {
    self.notices.last().filter(|notice| !notice.is_expired())
  }

  /// Forget expired notices. Returns `true` if any were dropped.
  pub fn prune_notices(&mut self) -> bool {
    let before = self.notices.len();
    self.notices.retain(|notice| !notice.is_expired());
    self.notices.len() != before
  }

  /// End the session. Pending tasks finish into closed channels.
  pub fn close(self) {
    self.cache.clear();
    info!(pending_mutations = self.pending_mutations, "session closed");
  }
}
