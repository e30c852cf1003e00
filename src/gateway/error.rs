use thiserror::Error;

use super::Action;

/// Failure of a single gateway call.
///
/// `Network` and `Status` are the transport-level failures, `Protocol` covers
/// bodies that do not have the expected shape and `Rejected` is the backend
/// explicitly refusing the operation (`"success": false`).
#[derive(Debug, Error)]
pub enum GatewayError {
  /// Connection refused, DNS failure, TLS error, reset while reading...
  #[error("{action}: request failed: {source}")]
  Network {
    action: &'static str,
    #[source]
    source: reqwest::Error,
  },

  /// The endpoint answered with a non-success status code.
  #[error("{action}: HTTP {status}: {message}")]
  Status {
    action: &'static str,
    status: u16,
    message: String,
  },

  /// The response body could not be understood.
  #[error("{action}: unexpected response: {message}")]
  Protocol {
    action: &'static str,
    message: String,
  },

  /// The backend processed the request and refused it.
  #[error("{action}: rejected by server: {message}")]
  Rejected {
    action: &'static str,
    message: String,
  },
}

impl GatewayError {
  pub(crate) fn protocol(action: Action, message: impl Into<String>) -> Self {
    Self::Protocol {
      action: action.as_str(),
      message: message.into(),
    }
  }

  pub(crate) fn rejected(action: Action, message: impl Into<String>) -> Self {
    Self::Rejected {
      action: action.as_str(),
      message: message.into(),
    }
  }

  pub(crate) fn status(action: Action, status: u16, message: impl Into<String>) -> Self {
    Self::Status {
      action: action.as_str(),
      status,
      message: message.into(),
    }
  }

  /// Returns `true` for transport failures (no usable response).
  pub fn is_network(&self) -> bool {
    matches!(self, Self::Network { .. } | Self::Status { .. })
  }

  /// Name of the action that failed.
  pub fn action(&self) -> &'static str {
    match self {
      Self::Network { action, .. }
      | Self::Status { action, .. }
      | Self::Protocol { action, .. }
      | Self::Rejected { action, .. } => action,
    }
  }
}
