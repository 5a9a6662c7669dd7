//! Observations and the realtime overlay.
//!
//! An observation is one recorded price and count for an item. Its labels
//! are decided once, when it is appended, and are never rewritten.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ─── Labels ──────────────────────────────────────────────────────────────────

/// Retention tier. An observation carrying a label is a representative
/// sample for queries at that granularity.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Label {
  Day,
  Month,
  Year,
}

impl Label {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Day => "day",
      Self::Month => "month",
      Self::Year => "year",
    }
  }
}

impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The label set of one observation. Serialises as a list in
/// `day, month, year` order.
pub type Labels = BTreeSet<Label>;

// ─── Observation ─────────────────────────────────────────────────────────────

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
  pub observation_id: Uuid,
  /// Server-assigned on append; only the correction path may change it.
  pub registered_at:  NaiveDateTime,
  pub item_id:        Uuid,
  /// Normalised decimal string, see [`crate::calendar::validate_price`].
  pub price:          String,
  pub count:          i64,
  pub labels:         Labels,
}

impl Observation {
  pub fn has_label(&self, label: Label) -> bool { self.labels.contains(&label) }
}

/// Input to [`crate::store::PriceStore::record_observation`].
/// Identity, timestamp and labels are always decided by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewObservation {
  pub item_id: Uuid,
  pub price:   String,
  pub count:   i64,
}

/// Fields a correction may overwrite. Labels are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObservationPatch {
  /// Accepts a naive timestamp or an RFC 3339 one; an offset is dropped and
  /// the wall-clock part kept.
  #[serde(default, deserialize_with = "wall_clock")]
  pub registered_at: Option<NaiveDateTime>,
  pub item_id:       Option<Uuid>,
  pub price:         Option<String>,
  pub count:         Option<i64>,
}

fn wall_clock<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
  D: Deserializer<'de>,
{
  let Some(raw) = Option::<String>::deserialize(deserializer)? else {
    return Ok(None);
  };
  if let Ok(aware) = DateTime::parse_from_rfc3339(&raw) {
    return Ok(Some(aware.naive_local()));
  }
  raw.parse::<NaiveDateTime>().map(Some).map_err(serde::de::Error::custom)
}

// ─── Realtime overlay ────────────────────────────────────────────────────────

/// The latest two observations of an item, kept denormalised for O(1)
/// "current price" reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeOverlay {
  pub item_id:        Uuid,
  /// `None` until the item has at least two observations.
  pub previous_price: Option<String>,
  pub last_price:     String,
  pub previous_count: Option<i64>,
  pub last_count:     i64,
}

impl RealtimeOverlay {
  /// The overlay row for an item's first observation.
  pub fn first(item_id: Uuid, price: String, count: i64) -> Self {
    Self {
      item_id,
      previous_price: None,
      last_price: price,
      previous_count: None,
      last_count: count,
    }
  }

  /// Shift the current `last_*` values into `previous_*` and record the new
  /// observation as `last_*`.
  pub fn advance(self, price: String, count: i64) -> Self {
    Self {
      item_id:        self.item_id,
      previous_price: Some(self.last_price),
      last_price:     price,
      previous_count: Some(self.last_count),
      last_count:     count,
    }
  }
}
