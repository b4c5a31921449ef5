//! mandir server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `MANDIR_*` environment variables, opens the SQLite store, and serves the
//! booking flow and the JSON API on one listener.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use mandir_server::{AppState, ServerConfig, qr::QR_SUBDIR};
use mandir_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Mandir darshan booking server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  let qr_dir = server_cfg.static_dir.join(QR_SUBDIR);
  tokio::fs::create_dir_all(&qr_dir)
    .await
    .with_context(|| format!("failed to create {qr_dir:?}"))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = mandir_server::router(AppState::new(store, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
