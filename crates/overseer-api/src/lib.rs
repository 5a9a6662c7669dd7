//! JSON REST API for the Overseer price ledger.
//!
//! Exposes an axum [`Router`] backed by any [`overseer_core::store::PriceStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", overseer_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod items;
pub mod records;

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use overseer_core::{
  clock::{Clock, SystemClock},
  ledger::Ledger,
  store::PriceStore,
};
use serde_json::{Value, json};

pub use auth::{Account, AccountGate};
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, C = SystemClock> {
  pub ledger: Arc<Ledger<S, C>>,
  pub gate:   Arc<AccountGate>,
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self { ledger: Arc::clone(&self.ledger), gate: Arc::clone(&self.gate) }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(state: AppState<S, C>) -> Router<()>
where
  S: PriceStore + 'static,
  C: Clock + 'static,
{
  Router::new()
    // Records
    .route(
      "/records",
      get(records::history::<S, C>).post(records::create::<S, C>),
    )
    .route("/records/realtime", get(records::realtime::<S, C>))
    .route(
      "/records/{id}",
      get(records::get_one::<S, C>)
        .put(records::update::<S, C>)
        .delete(records::delete_one::<S, C>),
    )
    // Items
    .route("/items", get(items::list::<S, C>).post(items::create::<S, C>))
    .route(
      "/items/{id}",
      get(items::get_one::<S, C>).delete(items::delete_one::<S, C>),
    )
    // Setup
    .route("/version", get(version))
    .with_state(state)
}

/// `GET /version`
async fn version() -> Json<Value> {
  Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}
