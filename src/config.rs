use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::model::EntityKind;

#[derive(Debug, Clone)]
pub struct Config {
  pub endpoint: EndpointConfig,
  /// Custom title for header (defaults to the endpoint host if not set)
  pub title: Option<String>,
  pub cache: CacheConfig,
  pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
  pub url: Url,
  /// Request timeout; requests wait indefinitely when unset
  pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Set to false to send every read to the endpoint
  pub enabled: bool,
  pub ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      ttl_secs: 300,
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

/// Page size per collection. Unset (or 0) loads the whole collection at once.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
  pub quotations: Option<usize>,
  pub products: Option<usize>,
  pub customers: Option<usize>,
}

impl Default for PaginationConfig {
  fn default() -> Self {
    Self {
      quotations: Some(20),
      products: None,
      customers: None,
    }
  }
}

impl PaginationConfig {
  pub fn page_size(&self, kind: EntityKind) -> Option<usize> {
    let size = match kind {
      EntityKind::Quotation => self.quotations,
      EntityKind::Product => self.products,
      EntityKind::Customer => self.customers,
    };
    size.filter(|n| *n > 0)
  }
}

/// On-disk shape; the endpoint may come from the command line instead.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
  #[serde(default)]
  endpoint: FileEndpoint,
  title: Option<String>,
  #[serde(default)]
  cache: CacheConfig,
  #[serde(default)]
  pagination: PaginationConfig,
}

#[derive(Debug, Default, Deserialize)]
struct FileEndpoint {
  url: Option<Url>,
  timeout_secs: Option<u64>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./quotedesk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/quotedesk/config.yaml
  ///
  /// Without a file, `endpoint_override` alone is enough to start.
  pub fn load(explicit_path: Option<&Path>, endpoint_override: Option<Url>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let file = match path {
      Some(p) => Self::read_file(&p)?,
      None => FileConfig::default(),
    };
    Self::resolve(file, endpoint_override)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("quotedesk.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("quotedesk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn read_file(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  /// Parse YAML text, then apply the endpoint override.
  pub fn from_yaml(contents: &str, endpoint_override: Option<Url>) -> Result<Self> {
    let file: FileConfig =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse config: {}", e))?;
    Self::resolve(file, endpoint_override)
  }

  fn resolve(file: FileConfig, endpoint_override: Option<Url>) -> Result<Self> {
    let url = endpoint_override.or(file.endpoint.url).ok_or_else(|| {
      eyre!(
        "No endpoint configured. Pass --endpoint, set QUOTEDESK_ENDPOINT, or add \
         `endpoint.url` to ~/.config/quotedesk/config.yaml"
      )
    })?;

    if !matches!(url.scheme(), "http" | "https") {
      return Err(eyre!("Endpoint must be an http(s) URL, got {}", url));
    }

    Ok(Self {
      endpoint: EndpointConfig {
        url,
        timeout_secs: file.endpoint.timeout_secs,
      },
      title: file.title,
      cache: file.cache,
      pagination: file.pagination,
    })
  }

  /// Header title: the configured one, else the endpoint host.
  pub fn display_title(&self) -> String {
    self
      .title
      .clone()
      .or_else(|| self.endpoint.url.host_str().map(String::from))
      .unwrap_or_else(|| "quotedesk".to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
  }

  #[test]
  fn test_full_config() {
    let config = Config::from_yaml(
      r#"
endpoint:
  url: https://script.example.com/macros/s/abc/exec
  timeout_secs: 30
title: Shop
cache:
  enabled: false
  ttl_secs: 60
pagination:
  quotations: 50
  products: 100
"#,
      None,
    )
    .unwrap();

    assert_eq!(config.endpoint.url.host_str(), Some("script.example.com"));
    assert_eq!(config.endpoint.timeout_secs, Some(30));
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.ttl(), Duration::from_secs(60));
    assert_eq!(config.pagination.page_size(EntityKind::Quotation), Some(50));
    assert_eq!(config.pagination.page_size(EntityKind::Product), Some(100));
    assert_eq!(config.pagination.page_size(EntityKind::Customer), None);
    assert_eq!(config.display_title(), "Shop");
  }

  #[test]
  fn test_defaults() {
    let config = Config::from_yaml("endpoint:\n  url: https://sheet.example.com/exec\n", None).unwrap();

    assert_eq!(config.endpoint.timeout_secs, None);
    assert_eq!(config.cache, CacheConfig::default());
    assert_eq!(config.cache.ttl(), Duration::from_secs(300));
    assert_eq!(config.pagination.page_size(EntityKind::Quotation), Some(20));
    assert_eq!(config.pagination.page_size(EntityKind::Product), None);
    assert_eq!(config.display_title(), "sheet.example.com");
  }

  #[test]
  fn test_override_wins_over_file() {
    let config = Config::from_yaml(
      "endpoint:\n  url: https://old.example.com/exec\n",
      Some(url("https://new.example.com/exec")),
    )
    .unwrap();
    assert_eq!(config.endpoint.url.host_str(), Some("new.example.com"));
  }

  #[test]
  fn test_override_without_file() {
    let config = Config::resolve(FileConfig::default(), Some(url("http://localhost:8080/exec"))).unwrap();
    assert_eq!(config.endpoint.url.port(), Some(8080));
  }

  #[test]
  fn test_missing_endpoint_is_an_error() {
    assert!(Config::from_yaml("title: Shop\n", None).is_err());
  }

  #[test]
  fn test_non_http_endpoint_rejected() {
    assert!(Config::from_yaml("endpoint:\n  url: ftp://example.com/x\n", None).is_err());
  }

  #[test]
  fn test_zero_page_size_means_unpaged() {
    let config = Config::from_yaml(
      "endpoint:\n  url: https://e.example.com/\npagination:\n  quotations: 0\n",
      None,
    )
    .unwrap();
    assert_eq!(config.pagination.page_size(EntityKind::Quotation), None);
  }
}
