//! Gateway to the spreadsheet-backed remote procedure endpoint.
//!
//! Every operation is a named [`Action`] plus a flat parameter map. The
//! [`Gateway`] trait is the seam between the sync layer and the network so
//! the orchestration can be driven by an in-process fake in tests.

pub mod api_types;
mod client;
mod error;

pub use client::RemoteGateway;
pub use error::GatewayError;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::fmt;

/// Parameters sent alongside an action (merged into the request body).
pub type Params = Map<String, Value>;

/// Actions understood by the remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
  GetQuotations,
  GetProducts,
  GetCustomers,
  SaveQuotation,
  SaveProduct,
  SaveCustomer,
  DeleteQuotation,
  DeleteProduct,
  DeleteCustomer,
}

impl Action {
  /// Wire name of the action.
  pub fn as_str(self) -> &'static str {
    match self {
      Action::GetQuotations => "getQuotations",
      Action::GetProducts => "getProducts",
      Action::GetCustomers => "getCustomers",
      Action::SaveQuotation => "saveQuotation",
      Action::SaveProduct => "saveProduct",
      Action::SaveCustomer => "saveCustomer",
      Action::DeleteQuotation => "deleteQuotation",
      Action::DeleteProduct => "deleteProduct",
      Action::DeleteCustomer => "deleteCustomer",
    }
  }

  /// Whether the action changes data on the backend.
  pub fn is_mutation(self) -> bool {
    !matches!(
      self,
      Action::GetQuotations | Action::GetProducts | Action::GetCustomers
    )
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Issues one request to the remote endpoint and returns the parsed body.
///
/// The returned future owns everything it needs so it can be handed to a
/// spawned task.
pub trait Gateway: Send + Sync {
  fn call(&self, action: Action, params: Params) -> BoxFuture<'static, Result<Value, GatewayError>>;
}
