//! File-based tracing. The terminal belongs to the TUI, so nothing is
//! written to stdout or stderr.

use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "QUOTEDESK_LOG";
const LOG_FILE: &str = "quotedesk.log";

/// Default log location: `$XDG_DATA_HOME/quotedesk/quotedesk.log`.
pub fn default_log_path() -> PathBuf {
  dirs::data_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("quotedesk")
    .join(LOG_FILE)
}

fn level_for(verbose: u8) -> &'static str {
  match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  }
}

/// Install the global subscriber. The returned guard must be held for the
/// lifetime of the app so buffered lines are flushed on exit.
pub fn init(log_file: &Path, verbose: u8) -> Result<WorkerGuard> {
  let filter = EnvFilter::try_from_env(LOG_ENV)
    .unwrap_or_else(|_| EnvFilter::new(format!("quotedesk={}", level_for(verbose))));

  let dir = log_file.parent().unwrap_or(Path::new("."));
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;
  let file_name = log_file
    .file_name()
    .ok_or_else(|| eyre!("Log path has no file name: {}", log_file.display()))?;

  let appender = tracing_appender::rolling::never(dir, file_name);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(filter)
    .with(
      fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  Ok(guard)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_verbosity_levels() {
    assert_eq!(level_for(0), "warn");
    assert_eq!(level_for(2), "debug");
    assert_eq!(level_for(9), "trace");
  }

  #[test]
  fn test_default_path_ends_in_app_dir() {
    let path = default_log_path();
    assert!(path.ends_with("quotedesk/quotedesk.log"));
  }
}
