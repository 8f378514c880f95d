//! Waitroom server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `WAITROOM_*` environment variables, opens the SQLite store, starts the
//! summary worker and serves the JSON API under `/api`.
//!
//! ```text
//! WAITROOM_LLM__API_KEY=sk-... cargo run -p waitroom-server -- --config config.toml
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use waitroom_engine::{Notifier, Orchestrator, summary_channel};
use waitroom_llm::OpenAiClient;
use waitroom_server::{ServerConfig, expand_tilde};
use waitroom_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Waitroom patient intake server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("WAITROOM")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.llm.api_key.is_empty() {
    tracing::warn!("no API key configured for the reasoning service");
  }

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  let reasoner = OpenAiClient::new(server_cfg.llm.clone())
    .context("failed to build reasoning client")?;
  let reasoner = Arc::new(reasoner);

  // Summary worker, with its own shutdown scope.
  let notifier = Notifier::default();
  let (queue, worker) = summary_channel(store.clone(), reasoner.clone(), notifier.clone());
  let worker_shutdown = CancellationToken::new();
  let worker = tokio::spawn(worker.run(worker_shutdown.clone()));

  // Cancelled on Ctrl-C: ends open summary streams, then lets serve drain.
  let http_shutdown = CancellationToken::new();
  tokio::spawn(shutdown_signal(http_shutdown.clone()));

  let orchestrator = Orchestrator::new(store, reasoner, queue, server_cfg.engine_config());
  let app = Router::new()
    .nest(
      "/api",
      waitroom_api::api_router(orchestrator, notifier, http_shutdown.clone()),
    )
    .layer(TraceLayer::new_for_http());

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(http_shutdown.cancelled_owned())
    .await
    .context("server error")?;

  tracing::info!("server stopped; draining summary queue");
  worker_shutdown.cancel();
  worker.await.context("summary worker panicked")?;

  Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
  match tokio::signal::ctrl_c().await {
    Ok(()) => {
      tracing::info!("shutdown requested");
      token.cancel();
    }
    Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c"),
  }
}
