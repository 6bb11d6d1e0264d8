//! vidtube server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, repairs any drifted counters and serves the JSON API over HTTP.
//!
//! # One-off reconciliation
//!
//! ```sh
//! cargo run -p vidtube-server -- --reconcile-once
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vidtube_api::AppState;
use vidtube_core::reconcile::Reconciler;
use vidtube_server::{ServerConfig, expand_tilde, spawn_reconciler};
use vidtube_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "vidtube API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Run one reconciliation sweep, print its report and exit.
  #[arg(long)]
  reconcile_once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  let report = Reconciler::new(Arc::clone(&store))
    .sweep()
    .await
    .context("start-up reconciliation failed")?;
  if cli.reconcile_once {
    println!("{}", serde_json::to_string_pretty(&report)?);
    return Ok(());
  }
  tracing::info!(
    counters_repaired = report.counters_repaired,
    caches_repaired = report.caches_repaired,
    "start-up reconciliation complete"
  );

  if let Some(every) = server_cfg.reconcile_interval() {
    spawn_reconciler(Arc::clone(&store), every);
  }

  let state = AppState::new(store, server_cfg.api_settings());
  let app = vidtube_server::app(state, &server_cfg)?;
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
