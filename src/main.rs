mod app;
mod cache;
mod commands;
mod config;
mod event;
mod gateway;
mod logging;
mod model;
mod store;
mod sync;
mod ui;

use cache::ResultCache;
use clap::{Parser, ValueEnum};
use color_eyre::Result;
use gateway::RemoteGateway;
use model::EntityKind;
use std::path::PathBuf;
use std::sync::Arc;
use sync::ViewSync;
use tracing::info;
use url::Url;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Section {
  Quotations,
  Products,
  Customers,
}

impl From<Section> for EntityKind {
  fn from(section: Section) -> Self {
    match section {
      Section::Quotations => EntityKind::Quotation,
      Section::Products => EntityKind::Product,
      Section::Customers => EntityKind::Customer,
    }
  }
}

#[derive(Parser, Debug)]
#[command(name = "quotedesk")]
#[command(about = "A terminal client for quotations, products and customers kept in a spreadsheet")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/quotedesk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Endpoint URL, overriding the config file
  #[arg(short, long, env = "QUOTEDESK_ENDPOINT")]
  endpoint: Option<Url>,

  /// Section to open first
  #[arg(short, long, value_enum, default_value = "quotations")]
  tab: Section,

  /// Always go to the endpoint, never reuse earlier results
  #[arg(long)]
  no_cache: bool,

  /// Log file (default: $XDG_DATA_HOME/quotedesk/quotedesk.log)
  #[arg(long)]
  log_file: Option<PathBuf>,

  /// More log detail; repeat for more
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let log_file = args.log_file.unwrap_or_else(logging::default_log_path);
  let _log_guard = logging::init(&log_file, args.verbose)?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref(), args.endpoint)?;
  info!(endpoint = %config.endpoint.url, "starting");

  let gateway = RemoteGateway::new(&config.endpoint)?;
  let cache = if args.no_cache {
    ResultCache::disabled()
  } else {
    ResultCache::from_config(&config.cache)
  };
  let host = gateway.endpoint().host_str().unwrap_or_default().to_string();
  let sync = ViewSync::new(Arc::new(gateway), cache, &config.pagination);

  // Initialize and run the app
  let app = app::App::new(sync, config.display_title(), host, args.tab.into());
  app.run().await?;

  Ok(())
}
