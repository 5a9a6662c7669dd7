//! Handlers for `/records` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/records` | `?item_id&period[&year_offset]`; labelled history |
//! | `GET`    | `/records/realtime` | `?item_id`; latest two observations |
//! | `GET`    | `/records/:id` | Single observation |
//! | `POST`   | `/records` | Body: [`NewRecordBody`]; returns 201 + observation |
//! | `PUT`    | `/records/:id` | Body: [`ObservationPatch`]; returns 204 |
//! | `DELETE` | `/records/:id` | Returns 204 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use overseer_core::{
  auth::Permission,
  clock::Clock,
  observation::{Observation, ObservationPatch, RealtimeOverlay},
  store::PriceStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Caller, error::ApiError};

/// The item must exist before anything is recorded against it.
async fn ensure_item<S, C>(state: &AppState<S, C>, item_id: Uuid) -> Result<(), ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state
    .ledger
    .get_item(item_id)
    .await?
    .map(|_| ())
    .ok_or_else(|| ApiError::NotFound(format!("item {item_id} not found")))
}

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub item_id:     Uuid,
  /// `year`, `month` or `day`.
  pub period:      String,
  /// Year-length blocks to step back; only meaningful for `year`.
  pub year_offset: Option<i64>,
}

/// `GET /records?item_id=<id>&period=<period>[&year_offset=<n>]`
pub async fn history<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(actor): Caller,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<Observation>>, ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state.gate.require(&actor, Permission::ReadRecords)?;
  let rows = state
    .ledger
    .query_history(params.item_id, &params.period, params.year_offset)
    .await?;
  Ok(Json(rows))
}

// ─── Realtime ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RealtimeParams {
  pub item_id: Uuid,
}

/// `GET /records/realtime?item_id=<id>`
pub async fn realtime<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(actor): Caller,
  Query(params): Query<RealtimeParams>,
) -> Result<Json<RealtimeOverlay>, ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state.gate.require(&actor, Permission::ReadRecords)?;
  let overlay = state
    .ledger
    .query_latest(params.item_id)
    .await?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no records for item {}", params.item_id))
    })?;
  Ok(Json(overlay))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /records/:id`
pub async fn get_one<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Observation>, ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state.gate.require(&actor, Permission::ReadRecords)?;
  let observation = state
    .ledger
    .find_one(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("record {id} not found")))?;
  Ok(Json(observation))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /records`.
#[derive(Debug, Deserialize)]
pub struct NewRecordBody {
  pub item_id: Uuid,
  pub price:   String,
  pub count:   i64,
}

/// `POST /records`: returns 201 + the stored [`Observation`]. An account
/// without `insert_records` may still insert by also sending the access key.
pub async fn create<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(actor): Caller,
  headers: HeaderMap,
  Json(body): Json<NewRecordBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state.gate.require_insert(&actor, &headers)?;
  ensure_item(&state, body.item_id).await?;

  let observation = state
    .ledger
    .ingest(body.item_id, &body.price, body.count)
    .await?;
  Ok((StatusCode::CREATED, Json(observation)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /records/:id`, body: any subset of
/// `{"registered_at", "item_id", "price", "count"}`.
pub async fn update<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
  Json(patch): Json<ObservationPatch>,
) -> Result<StatusCode, ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state.gate.require(&actor, Permission::UpdateRecords)?;
  if let Some(item_id) = patch.item_id {
    ensure_item(&state, item_id).await?;
  }

  state.ledger.correct(id, patch).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /records/:id`
pub async fn delete_one<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state.gate.require(&actor, Permission::DeleteRecords)?;
  state.ledger.remove(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
