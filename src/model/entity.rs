//! The traits and kinds shared by every synced record.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

use super::ValidationError;
use crate::gateway::Action;

/// The three collections kept in sync with the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
  Quotation,
  Product,
  Customer,
}

impl EntityKind {
  pub const ALL: [EntityKind; 3] = [
    EntityKind::Quotation,
    EntityKind::Product,
    EntityKind::Customer,
  ];

  pub fn list_action(self) -> Action {
    match self {
      EntityKind::Quotation => Action::GetQuotations,
      EntityKind::Product => Action::GetProducts,
      EntityKind::Customer => Action::GetCustomers,
    }
  }

  pub fn save_action(self) -> Action {
    match self {
      EntityKind::Quotation => Action::SaveQuotation,
      EntityKind::Product => Action::SaveProduct,
      EntityKind::Customer => Action::SaveCustomer,
    }
  }

  pub fn delete_action(self) -> Action {
    match self {
      EntityKind::Quotation => Action::DeleteQuotation,
      EntityKind::Product => Action::DeleteProduct,
      EntityKind::Customer => Action::DeleteCustomer,
    }
  }

  /// Key the sheet script uses for this collection in list responses.
  pub fn collection_key(self) -> &'static str {
    match self {
      EntityKind::Quotation => "quotations",
      EntityKind::Product => "products",
      EntityKind::Customer => "customers",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      EntityKind::Quotation => "Quotation",
      EntityKind::Product => "Product",
      EntityKind::Customer => "Customer",
    }
  }

  pub fn plural(self) -> &'static str {
    match self {
      EntityKind::Quotation => "Quotations",
      EntityKind::Product => "Products",
      EntityKind::Customer => "Customers",
    }
  }
}

/// A record that can be listed, saved and deleted through the gateway.
///
/// Implementors identify themselves with a string id and know how to check
/// and normalise their own fields before they are sent.
pub trait Entity: Debug + Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  const KIND: EntityKind;

  fn id(&self) -> &str;

  fn set_id(&mut self, id: String);

  /// Human-readable name for lists and notices.
  fn display_name(&self) -> &str;

  /// Check required fields before submission.
  fn validate(&self) -> Result<(), ValidationError>;

  /// Recompute derived fields. Called on every save.
  fn prepare(&mut self) {}
}

/// Generate an id for a record created on this client.
pub fn new_id() -> String {
  Uuid::new_v4().to_string()
}
