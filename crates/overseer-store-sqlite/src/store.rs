//! [`SqliteStore`] — the SQLite implementation of [`PriceStore`].

use std::path::Path;

use chrono::NaiveDateTime;
use overseer_core::{
  item::{Item, NewItem},
  labels::{assign_labels, max_lookback},
  observation::{NewObservation, Observation, ObservationPatch, RealtimeOverlay},
  store::PriceStore,
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Value};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    OBSERVATION_COLUMNS, RawItem, RawObservation, RawOverlay, encode_labels,
    encode_ts, encode_uuid, truncate_ts,
  },
  error::in_call,
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Observations of one item with `from <= registered_at <= to`, oldest first.
fn select_window(
  conn:    &rusqlite::Connection,
  item_id: &str,
  from:    &str,
  to:      &str,
) -> rusqlite::Result<Vec<RawObservation>> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {OBSERVATION_COLUMNS} FROM observations
     WHERE item_id = ?1 AND registered_at >= ?2 AND registered_at <= ?3
     ORDER BY registered_at, observation_id"
  ))?;
  stmt
    .query_map(rusqlite::params![item_id, from, to], RawObservation::from_row)?
    .collect()
}

fn select_overlay(
  conn:    &rusqlite::Connection,
  item_id: &str,
) -> rusqlite::Result<Option<RawOverlay>> {
  conn
    .query_row(
      "SELECT item_id, previous_price, last_price, previous_count, last_count
       FROM realtime_overlays WHERE item_id = ?1",
      rusqlite::params![item_id],
      RawOverlay::from_row,
    )
    .optional()
}

/// `%name%`, with `LIKE` metacharacters in `name` escaped by `\`.
fn contains_pattern(name: &str) -> String {
  let mut pattern = String::with_capacity(name.len() + 2);
  pattern.push('%');
  for c in name.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Overseer price ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// run on the same connection thread, and writes take the database lock up
/// front with `BEGIN IMMEDIATE`, so two appends for one item never
/// interleave.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PriceStore impl ─────────────────────────────────────────────────────────

impl PriceStore for SqliteStore {
  type Error = Error;

  // ── Ledger ────────────────────────────────────────────────────────────────

  async fn record_observation(
    &self,
    input: NewObservation,
    now:   NaiveDateTime,
  ) -> Result<Observation> {
    let now      = truncate_ts(now);
    let item_str = encode_uuid(input.item_id);
    let from_str = encode_ts(now - max_lookback());
    let now_str  = encode_ts(now);

    let observation = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let recent = select_window(&tx, &item_str, &from_str, &now_str)?
          .into_iter()
          .map(RawObservation::into_observation)
          .collect::<Result<Vec<_>>>()
          .map_err(in_call)?;

        let observation = Observation {
          observation_id: Uuid::new_v4(),
          registered_at:  now,
          item_id:        input.item_id,
          price:          input.price,
          count:          input.count,
          labels:         assign_labels(now, &recent),
        };
        let labels_str = encode_labels(&observation.labels).map_err(in_call)?;

        tx.execute(
          "INSERT INTO observations (
             observation_id, registered_at, item_id, price, count, labels
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(observation.observation_id),
            now_str,
            item_str,
            observation.price,
            observation.count,
            labels_str,
          ],
        )?;

        let overlay = match select_overlay(&tx, &item_str)? {
          Some(raw) => raw
            .into_overlay()
            .map_err(in_call)?
            .advance(observation.price.clone(), observation.count),
          None => RealtimeOverlay::first(
            observation.item_id,
            observation.price.clone(),
            observation.count,
          ),
        };

        tx.execute(
          "INSERT INTO realtime_overlays (
             item_id, previous_price, last_price, previous_count, last_count
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (item_id) DO UPDATE SET
             previous_price = excluded.previous_price,
             last_price     = excluded.last_price,
             previous_count = excluded.previous_count,
             last_count     = excluded.last_count",
          rusqlite::params![
            item_str,
            overlay.previous_price,
            overlay.last_price,
            overlay.previous_count,
            overlay.last_count,
          ],
        )?;

        tx.commit()?;
        Ok(observation)
      })
      .await?;

    debug!(
      observation_id = %observation.observation_id,
      labels = ?observation.labels,
      "labels assigned"
    );
    Ok(observation)
  }

  async fn find_window(
    &self,
    item_id: Uuid,
    from:    NaiveDateTime,
    to:      NaiveDateTime,
  ) -> Result<Vec<Observation>> {
    let item_str = encode_uuid(item_id);
    let from_str = encode_ts(from);
    let to_str   = encode_ts(to);

    let raws = self
      .conn
      .call(move |conn| Ok(select_window(conn, &item_str, &from_str, &to_str)?))
      .await?;

    raws.into_iter().map(RawObservation::into_observation).collect()
  }

  async fn get_observation(&self, id: Uuid) -> Result<Option<Observation>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawObservation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {OBSERVATION_COLUMNS} FROM observations
                 WHERE observation_id = ?1"
              ),
              rusqlite::params![id_str],
              RawObservation::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawObservation::into_observation).transpose()
  }

  async fn edit_observation(
    &self,
    id:    Uuid,
    patch: ObservationPatch,
  ) -> Result<()> {
    let mut sets: Vec<&'static str> = vec![];
    let mut values: Vec<Value> = vec![];

    if let Some(at) = patch.registered_at {
      sets.push("registered_at = ?");
      values.push(Value::Text(encode_ts(truncate_ts(at))));
    }
    if let Some(item_id) = patch.item_id {
      sets.push("item_id = ?");
      values.push(Value::Text(encode_uuid(item_id)));
    }
    if let Some(price) = patch.price {
      sets.push("price = ?");
      values.push(Value::Text(price));
    }
    if let Some(count) = patch.count {
      sets.push("count = ?");
      values.push(Value::Integer(count));
    }
    values.push(Value::Text(encode_uuid(id)));

    let found: bool = self
      .conn
      .call(move |conn| {
        if sets.is_empty() {
          let exists = conn
            .query_row(
              "SELECT 1 FROM observations WHERE observation_id = ?",
              rusqlite::params_from_iter(values),
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          return Ok(exists);
        }

        let sql = format!(
          "UPDATE observations SET {} WHERE observation_id = ?",
          sets.join(", ")
        );
        let changed = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(changed > 0)
      })
      .await?;

    if found { Ok(()) } else { Err(Error::ObservationNotFound(id)) }
  }

  async fn delete_observation(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM observations WHERE observation_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if changed > 0 { Ok(()) } else { Err(Error::ObservationNotFound(id)) }
  }

  // ── Realtime overlay ──────────────────────────────────────────────────────

  async fn get_realtime(&self, item_id: Uuid) -> Result<Option<RealtimeOverlay>> {
    let item_str = encode_uuid(item_id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_overlay(conn, &item_str)?))
      .await?;

    raw.map(RawOverlay::into_overlay).transpose()
  }

  async fn delete_realtime(&self, item_id: Uuid) -> Result<()> {
    let item_str = encode_uuid(item_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM realtime_overlays WHERE item_id = ?1",
          rusqlite::params![item_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn add_item(&self, input: NewItem, now: NaiveDateTime) -> Result<Item> {
    let item = Item {
      item_id:    Uuid::new_v4(),
      name:       input.name,
      created_at: truncate_ts(now),
    };

    let id_str = encode_uuid(item.item_id);
    let name   = item.name.clone();
    let at_str = encode_ts(item.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO items (item_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(item)
  }

  async fn get_item(&self, id: Uuid) -> Result<Option<Item>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT item_id, name, created_at FROM items WHERE item_id = ?1",
              rusqlite::params![id_str],
              RawItem::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawItem::into_item).transpose()
  }

  async fn list_items(&self, name: Option<String>) -> Result<Vec<Item>> {
    let pattern = name.as_deref().map(contains_pattern);

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT item_id, name, created_at FROM items
           WHERE ?1 IS NULL OR name LIKE ?1 ESCAPE '\\'
           ORDER BY name, item_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern], RawItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawItem::into_item).collect()
  }

  async fn remove_item(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let removed: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "DELETE FROM realtime_overlays WHERE item_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM observations WHERE item_id = ?1",
          rusqlite::params![id_str],
        )?;
        let changed = tx.execute(
          "DELETE FROM items WHERE item_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(changed > 0)
      })
      .await?;

    if removed { Ok(()) } else { Err(Error::ItemNotFound(id)) }
  }
}
