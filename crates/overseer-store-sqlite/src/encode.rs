//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width `YYYY-MM-DDTHH:MM:SS.ffffff` strings
//! so that string comparison in SQL matches chronological order. Labels are
//! stored as a compact JSON list. UUIDs are stored as hyphenated lowercase
//! strings.

use chrono::{NaiveDateTime, SubsecRound as _};
use overseer_core::{
  item::Item,
  observation::{Labels, Observation, RealtimeOverlay},
};
use uuid::Uuid;

use crate::{Error, Result};

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const TS_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── NaiveDateTime ───────────────────────────────────────────────────────────

/// Drop precision below what the column stores, so a value read back equals
/// the value written.
pub fn truncate_ts(ts: NaiveDateTime) -> NaiveDateTime { ts.trunc_subsecs(6) }

pub fn encode_ts(ts: NaiveDateTime) -> String { ts.format(TS_FORMAT).to_string() }

pub fn decode_ts(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, TS_PARSE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Labels ──────────────────────────────────────────────────────────────────

pub fn encode_labels(labels: &Labels) -> Result<String> {
  Ok(serde_json::to_string(labels)?)
}

pub fn decode_labels(s: &str) -> Result<Labels> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawObservation`].
pub const OBSERVATION_COLUMNS: &str =
  "observation_id, registered_at, item_id, price, count, labels";

/// Raw values read directly from an `observations` row.
pub struct RawObservation {
  pub observation_id: String,
  pub registered_at:  String,
  pub item_id:        String,
  pub price:          String,
  pub count:          i64,
  pub labels:         String,
}

impl RawObservation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      observation_id: row.get(0)?,
      registered_at:  row.get(1)?,
      item_id:        row.get(2)?,
      price:          row.get(3)?,
      count:          row.get(4)?,
      labels:         row.get(5)?,
    })
  }

  pub fn into_observation(self) -> Result<Observation> {
    Ok(Observation {
      observation_id: decode_uuid(&self.observation_id)?,
      registered_at:  decode_ts(&self.registered_at)?,
      item_id:        decode_uuid(&self.item_id)?,
      price:          self.price,
      count:          self.count,
      labels:         decode_labels(&self.labels)?,
    })
  }
}

/// Raw values read directly from a `realtime_overlays` row.
pub struct RawOverlay {
  pub item_id:        String,
  pub previous_price: Option<String>,
  pub last_price:     String,
  pub previous_count: Option<i64>,
  pub last_count:     i64,
}

impl RawOverlay {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:        row.get(0)?,
      previous_price: row.get(1)?,
      last_price:     row.get(2)?,
      previous_count: row.get(3)?,
      last_count:     row.get(4)?,
    })
  }

  pub fn into_overlay(self) -> Result<RealtimeOverlay> {
    Ok(RealtimeOverlay {
      item_id:        decode_uuid(&self.item_id)?,
      previous_price: self.previous_price,
      last_price:     self.last_price,
      previous_count: self.previous_count,
      last_count:     self.last_count,
    })
  }
}

/// Raw values read directly from an `items` row.
pub struct RawItem {
  pub item_id:    String,
  pub name:       String,
  pub created_at: String,
}

impl RawItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:    row.get(0)?,
      name:       row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      item_id:    decode_uuid(&self.item_id)?,
      name:       self.name,
      created_at: decode_ts(&self.created_at)?,
    })
  }
}
