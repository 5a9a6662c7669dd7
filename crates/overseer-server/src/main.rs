//! overseer server binary.
//!
//! Loads [`ServerConfig`] from `--config` and the environment, opens the
//! SQLite ledger and serves it over HTTP.
//!
//! Account password hashes come from `overseer --hash-password`.

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use overseer_api::AppState;
use overseer_core::ledger::Ledger;
use overseer_server::{ServerConfig, hash_password, router};
use overseer_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Overseer price ledger server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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
  if cli.hash_password {
    return print_password_hash();
  }

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
  serve(cfg).await
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  if cfg.accounts.is_empty() && cfg.insert_access_key.is_none() {
    tracing::warn!("no accounts or insert access key configured; every request will be rejected");
  }

  let store_path = cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::info!(path = ?store_path, accounts = cfg.accounts.len(), "ledger opened");

  let app = router(AppState {
    ledger: Arc::new(Ledger::new(store)),
    gate:   Arc::new(cfg.gate()),
  });

  let address = cfg.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("listening on http://{address}");

  axum::serve(listener, app).await.context("server error")
}

fn print_password_hash() -> anyhow::Result<()> {
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;

  let hash = hash_password(line.trim_end_matches(['\n', '\r']))
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
  println!("{hash}");
  Ok(())
}
