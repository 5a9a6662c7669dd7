//! Handlers for `/items` endpoints.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use overseer_core::{
  auth::Permission,
  clock::Clock,
  item::{Item, NewItem},
  store::PriceStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Caller, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Substring match on the item name.
  pub name: Option<String>,
}

/// `GET /items[?name=<substring>]`
pub async fn list<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(actor): Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Item>>, ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state.gate.require(&actor, Permission::ReadItems)?;
  Ok(Json(state.ledger.list_items(params.name).await?))
}

/// `POST /items`, body: `{"name":"..."}`
pub async fn create<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(actor): Caller,
  Json(body): Json<NewItem>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state.gate.require(&actor, Permission::InsertItems)?;
  let item = state.ledger.add_item(body).await?;
  Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /items/:id`
pub async fn get_one<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Item>, ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state.gate.require(&actor, Permission::ReadItems)?;
  let item = state
    .ledger
    .get_item(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("item {id} not found")))?;
  Ok(Json(item))
}

/// `DELETE /items/:id`. Also drops the item's records and realtime row.
pub async fn delete_one<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PriceStore,
  C: Clock,
{
  state.gate.require(&actor, Permission::DeleteItems)?;
  state.ledger.remove_item(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
