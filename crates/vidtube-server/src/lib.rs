//! Server wiring for vidtube: configuration, middleware and the background
//! reconciliation task. The binary in `main.rs` only glues these together.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::{
  Router,
  extract::DefaultBodyLimit,
  http::{HeaderName, HeaderValue, Method, header},
};
use config::builder::{ConfigBuilder, DefaultState};
use serde::Deserialize;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vidtube_api::{ApiSettings, AppState, actor::ACTOR_HEADER, api_router};
use vidtube_core::{reconcile::Reconciler, store::PlatformStore};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `VIDTUBE_*` environment variables. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                    String,
  pub port:                    u16,
  /// SQLite database file. A leading `~/` is expanded.
  pub store_path:              PathBuf,
  /// Browser origin allowed by CORS. No CORS layer when unset.
  pub cors_origin:             Option<String>,
  pub edit_history_limit:      usize,
  /// Seconds between reconciliation sweeps; `0` disables the task.
  pub reconcile_interval_secs: u64,
  pub body_limit_bytes:        usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                    "127.0.0.1".to_owned(),
      port:                    8000,
      store_path:              PathBuf::from("vidtube.sqlite3"),
      cors_origin:             None,
      edit_history_limit:      10,
      reconcile_interval_secs: 300,
      body_limit_bytes:        16 * 1024,
    }
  }
}

impl ServerConfig {
  /// Read the optional TOML file at `path`, then overlay the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("VIDTUBE")),
    )
  }

  pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings { edit_history_limit: self.edit_history_limit }
  }

  pub fn reconcile_interval(&self) -> Option<Duration> {
    (self.reconcile_interval_secs > 0)
      .then(|| Duration::from_secs(self.reconcile_interval_secs))
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The API router wrapped in the server's middleware stack.
pub fn app<S>(state: AppState<S>, config: &ServerConfig) -> anyhow::Result<Router>
where
  S: PlatformStore + 'static,
{
  let mut app = api_router(state)
    .layer(DefaultBodyLimit::max(config.body_limit_bytes))
    .layer(TraceLayer::new_for_http());

  if let Some(origin) = &config.cors_origin {
    let origin: HeaderValue = origin
      .parse()
      .with_context(|| format!("invalid cors_origin {origin:?}"))?;
    app = app.layer(
      CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(ACTOR_HEADER)]),
    );
  }
  Ok(app)
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// Run a sweep every `every`, starting one period from now.
pub fn spawn_reconciler<S>(store: Arc<S>, every: Duration) -> JoinHandle<()>
where
  S: PlatformStore + 'static,
{
  let reconciler = Reconciler::new(store);
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
      ticker.tick().await;
      match reconciler.sweep().await {
        Ok(report) if !report.is_clean() => tracing::info!(
          counters_repaired = report.counters_repaired,
          caches_repaired = report.caches_repaired,
          "reconciliation sweep repaired drift"
        ),
        Ok(_) => {}
        Err(err) => tracing::error!(error = %err, "reconciliation sweep failed"),
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request, http::StatusCode};
  use config::{File, FileFormat};
  use tower::ServiceExt as _;
  use vidtube_store_sqlite::SqliteStore;

  use super::*;

  async fn test_app(config: &ServerConfig) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState::new(Arc::new(store), config.api_settings());
    app(state, config).unwrap()
  }

  #[test]
  fn toml_overrides_defaults() {
    let config = ServerConfig::from_builder(config::Config::builder().add_source(
      File::from_str(
        "port = 9000\ncors_origin = \"https://app.example.com\"\nreconcile_interval_secs = 0",
        FileFormat::Toml,
      ),
    ))
    .unwrap();

    assert_eq!(config.address(), "127.0.0.1:9000");
    assert_eq!(config.cors_origin.as_deref(), Some("https://app.example.com"));
    assert_eq!(config.edit_history_limit, 10);
    assert_eq!(config.reconcile_interval(), None);
    assert_eq!(config.store_path, PathBuf::from("vidtube.sqlite3"));
  }

  #[test]
  fn expand_tilde_leaves_plain_paths() {
    assert_eq!(expand_tilde(Path::new("/var/db.sqlite3")), PathBuf::from("/var/db.sqlite3"));
    assert_eq!(expand_tilde(Path::new("db.sqlite3")), PathBuf::from("db.sqlite3"));
  }

  #[tokio::test]
  async fn cors_origin_is_echoed() {
    let config = ServerConfig {
      cors_origin: Some("https://app.example.com".to_owned()),
      ..ServerConfig::default()
    };
    let req = Request::builder()
      .uri("/healthcheck")
      .header(header::ORIGIN, "https://app.example.com")
      .body(Body::empty())
      .unwrap();
    let resp = test_app(&config).await.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
      "https://app.example.com"
    );
  }

  #[tokio::test]
  async fn oversized_body_is_rejected() {
    let config = ServerConfig { body_limit_bytes: 64, ..ServerConfig::default() };
    let body = serde_json::json!({ "full_name": "x".repeat(256) }).to_string();
    let req = Request::builder()
      .method(Method::POST)
      .uri("/users")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body))
      .unwrap();
    let resp = test_app(&config).await.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["kind"], "invalid_argument");
  }
}
