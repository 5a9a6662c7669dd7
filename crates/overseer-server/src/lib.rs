//! HTTP server assembly for the Overseer price ledger.
//!
//! Wraps the [`overseer_api`] router with the setup endpoints and request
//! tracing, and defines the configuration the binary reads.

use std::path::{Path, PathBuf};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{Json, Router, routing::get};
use overseer_api::{Account, AccountGate, AppState, api_router};
use overseer_core::{clock::Clock, store::PriceStore};
use rand_core::OsRng;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `OVERSEER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// Shared key that lets a scraper insert records without an account.
  pub insert_access_key: Option<String>,
  #[serde(default)]
  pub accounts:          Vec<Account>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("overseer.db") }

impl ServerConfig {
  /// Read `path` if it exists, then let `OVERSEER_*` variables override it.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("OVERSEER"))
      .build()?
      .try_deserialize()
  }

  pub fn gate(&self) -> AccountGate {
    AccountGate::new(self.accounts.clone(), self.insert_access_key.clone())
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~/` replaced by `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf {
    expand_home(&self.store_path, std::env::var("HOME").ok().as_deref())
  }
}

fn expand_home(path: &Path, home: Option<&str>) -> PathBuf {
  match (path.strip_prefix("~"), home) {
    (Ok(rest), Some(home)) => Path::new(home).join(rest),
    _ => path.to_path_buf(),
  }
}

/// The argon2 PHC string for `password`, as accepted in an account's
/// `password_hash`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full application: `/healthz`, `/readyz` and the API under `/api/v1`.
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: PriceStore + 'static,
  C: Clock + 'static,
{
  Router::new()
    .route("/healthz", get(healthz))
    .route("/readyz", get(readyz))
    .nest("/api/v1", api_router(state))
    .layer(TraceLayer::new_for_http())
}

async fn healthz() -> Json<Value> { Json(json!({ "status": "healthy" })) }

async fn readyz() -> Json<Value> { Json(json!({ "status": "ready" })) }
