//! Request signatures and cache result metadata.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use tokio::time::Instant;

use crate::gateway::{Action, Params};

/// Stable, fixed-length cache key derived from an action and its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Signature {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A read request: the action plus every parameter that shapes its result.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestKey {
  action: Action,
  params: Params,
}

impl RequestKey {
  pub fn new(action: Action, params: Params) -> Self {
    Self { action, params }
  }

  pub fn action(&self) -> Action {
    self.action
  }

  pub fn params(&self) -> &Params {
    &self.params
  }

  /// Parameters in key order, independent of insertion order.
  fn canonical_params(&self) -> String {
    let mut pairs: Vec<(&String, &Value)> = self.params.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
      .into_iter()
      .map(|(key, value)| format!("{}={}", key, value))
      .collect::<Vec<_>>()
      .join("&")
  }

  pub fn signature(&self) -> Signature {
    let input = format!("{}:{}", self.action, self.canonical_params());

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    Signature(hex::encode(hasher.finalize()))
  }

  /// Short description for logs.
  pub fn description(&self) -> String {
    if self.params.is_empty() {
      self.action.to_string()
    } else {
      format!("{} {}", self.action, self.canonical_params())
    }
  }
}

/// A value plus where it came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
  /// When the value was stored (if served from cache)
  pub cached_at: Option<Instant>,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  pub fn from_cache(data: T, cached_at: Instant) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched through the gateway just now
  Network,
  /// Served from a fresh cache entry
  Cache,
}
