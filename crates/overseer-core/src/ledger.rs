//! [`Ledger`] — the caller-facing price ledger service.
//!
//! Validates input, supplies the clock, and applies the period-window rules
//! on top of any [`PriceStore`]. Authorization and item existence checks are
//! the caller's responsibility.

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  calendar::{validate_count, validate_period, validate_price, validate_year_offset},
  clock::{Clock, SystemClock},
  item::{Item, NewItem},
  observation::{NewObservation, Observation, ObservationPatch, RealtimeOverlay},
  store::PriceStore,
};

fn store_error<E: Into<Error>>(e: E) -> Error { e.into() }

pub struct Ledger<S, C = SystemClock> {
  store: S,
  clock: C,
}

impl<S: PriceStore> Ledger<S> {
  pub fn new(store: S) -> Self { Self::with_clock(store, SystemClock) }
}

impl<S: PriceStore, C: Clock> Ledger<S, C> {
  pub fn with_clock(store: S, clock: C) -> Self { Self { store, clock } }

  // ── Observations ──────────────────────────────────────────────────────

  /// Validate and append a new observation for `item_id`.
  pub async fn ingest(
    &self,
    item_id: Uuid,
    price: &str,
    count: i64,
  ) -> Result<Observation> {
    let input = NewObservation {
      item_id,
      price: validate_price(price)?,
      count: validate_count(count)?,
    };

    let observation = self
      .store
      .record_observation(input, self.clock.now())
      .await
      .map_err(store_error)?;

    info!(
      %item_id,
      observation_id = %observation.observation_id,
      labels = ?observation.labels,
      "observation recorded"
    );
    Ok(observation)
  }

  /// Observations of `item_id` in the window selected by `period` (and, for
  /// `year`, `year_offset`) that carry the period's label.
  pub async fn query_history(
    &self,
    item_id: Uuid,
    period: &str,
    year_offset: Option<i64>,
  ) -> Result<Vec<Observation>> {
    let period = validate_period(period)?;
    let year_offset = year_offset.map(validate_year_offset).transpose()?;

    let window = period.window(self.clock.now(), year_offset);
    debug!(%item_id, %period, from = %window.from, to = %window.to, "history window");

    let rows = self
      .store
      .find_window(item_id, window.from, window.to)
      .await
      .map_err(store_error)?;
    Ok(period.select(rows))
  }

  pub async fn query_latest(
    &self,
    item_id: Uuid,
  ) -> Result<Option<RealtimeOverlay>> {
    self.store.get_realtime(item_id).await.map_err(store_error)
  }

  pub async fn find_one(&self, id: Uuid) -> Result<Option<Observation>> {
    self.store.get_observation(id).await.map_err(store_error)
  }

  /// Overwrite selected fields of an existing observation. Price and count,
  /// when present, are validated the same way as on ingest.
  pub async fn correct(&self, id: Uuid, mut patch: ObservationPatch) -> Result<()> {
    if let Some(price) = &patch.price {
      patch.price = Some(validate_price(price)?);
    }
    if let Some(count) = patch.count {
      validate_count(count)?;
    }

    self.store.edit_observation(id, patch).await.map_err(store_error)?;
    info!(observation_id = %id, "observation corrected");
    Ok(())
  }

  pub async fn remove(&self, id: Uuid) -> Result<()> {
    self.store.delete_observation(id).await.map_err(store_error)?;
    info!(observation_id = %id, "observation removed");
    Ok(())
  }

  // ── Items ─────────────────────────────────────────────────────────────

  pub async fn add_item(&self, input: NewItem) -> Result<Item> {
    let item = self
      .store
      .add_item(input, self.clock.now())
      .await
      .map_err(store_error)?;
    info!(item_id = %item.item_id, name = %item.name, "item added");
    Ok(item)
  }

  pub async fn get_item(&self, id: Uuid) -> Result<Option<Item>> {
    self.store.get_item(id).await.map_err(store_error)
  }

  pub async fn list_items(&self, name: Option<String>) -> Result<Vec<Item>> {
    self.store.list_items(name).await.map_err(store_error)
  }

  pub async fn remove_item(&self, id: Uuid) -> Result<()> {
    self.store.remove_item(id).await.map_err(store_error)?;
    info!(item_id = %id, "item removed");
    Ok(())
  }
}
