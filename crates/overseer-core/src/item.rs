//! Tracked items, the things whose prices are recorded.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked in-game item. Observations reference it by `item_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub item_id:    Uuid,
  pub name:       String,
  pub created_at: NaiveDateTime,
}

/// Input to [`crate::store::PriceStore::add_item`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
  pub name: String,
}
