//! The `PriceStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `overseer-store-sqlite`). The [`crate::ledger::Ledger`] service and the
//! HTTP layer depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::{
  item::{Item, NewItem},
  observation::{NewObservation, Observation, ObservationPatch, RealtimeOverlay},
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a price ledger backend: the append-mostly observation
/// table, the realtime overlay and the item registry.
///
/// Backend errors convert into [`crate::Error`] so callers always see a
/// validation, not-found or transaction failure.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PriceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Append an observation registered at `now`.
  ///
  /// Reads the item's recent history, assigns labels with
  /// [`crate::labels::assign_labels`], inserts the row and upserts the
  /// item's realtime overlay. All of it happens in one transaction: either
  /// both the row and the overlay change, or neither does.
  fn record_observation(
    &self,
    input: NewObservation,
    now: NaiveDateTime,
  ) -> impl Future<Output = Result<Observation, Self::Error>> + Send + '_;

  /// All observations of `item_id` with `from <= registered_at <= to`,
  /// oldest first.
  fn find_window(
    &self,
    item_id: Uuid,
    from: NaiveDateTime,
    to: NaiveDateTime,
  ) -> impl Future<Output = Result<Vec<Observation>, Self::Error>> + Send + '_;

  /// Retrieve an observation by id. Returns `None` if not found.
  fn get_observation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Observation>, Self::Error>> + Send + '_;

  /// Overwrite the fields present in `patch`. Labels are never touched.
  /// Fails with a not-found error if `id` does not exist.
  fn edit_observation(
    &self,
    id: Uuid,
    patch: ObservationPatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete an observation. Fails with a not-found error if `id` does not
  /// exist, so a second delete of the same id fails.
  fn delete_observation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Realtime overlay ──────────────────────────────────────────────────

  fn get_realtime(
    &self,
    item_id: Uuid,
  ) -> impl Future<Output = Result<Option<RealtimeOverlay>, Self::Error>> + Send + '_;

  /// Drop the overlay row of an item. A missing row is not an error.
  fn delete_realtime(
    &self,
    item_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Items ─────────────────────────────────────────────────────────────

  fn add_item(
    &self,
    input: NewItem,
    now: NaiveDateTime,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  fn get_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  /// List items, optionally restricted to names containing `name`.
  fn list_items(
    &self,
    name: Option<String>,
  ) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + '_;

  /// Remove an item together with its observations and overlay row.
  fn remove_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
