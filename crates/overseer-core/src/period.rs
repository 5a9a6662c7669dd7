//! Period windows for history queries.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
  calendar::{days_in_month, days_in_year},
  observation::{Label, Observation},
};

/// Granularity of a history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
  Year,
  Month,
  Day,
}

/// An inclusive `[from, to]` range of `registered_at` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  pub from: NaiveDateTime,
  pub to:   NaiveDateTime,
}

impl Period {
  /// The label an observation must carry to be returned for this period.
  pub fn label(self) -> Label {
    match self {
      Self::Year => Label::Year,
      Self::Month => Label::Month,
      Self::Day => Label::Day,
    }
  }

  /// The window this period covers, ending at `now`.
  ///
  /// For [`Period::Year`], `year_offset = k` selects the `k`-th year-length
  /// block before the current one. Block length is always the current
  /// year's day count. The offset is ignored for the other periods.
  pub fn window(self, now: NaiveDateTime, year_offset: Option<u64>) -> Window {
    match self {
      Self::Year => {
        let year = i64::from(days_in_year(now.year()));
        let k = i64::try_from(year_offset.unwrap_or(0)).ok();
        let blocks = |n: Option<i64>| n.and_then(|n| n.checked_mul(year));
        Window {
          from: days_before(now, blocks(k.and_then(|k| k.checked_add(1)))),
          to:   days_before(now, blocks(k)),
        }
      }
      Self::Month => {
        let days = days_in_month(now.year(), now.month()).unwrap_or(31);
        Window { from: days_before(now, Some(i64::from(days))), to: now }
      }
      Self::Day => Window { from: days_before(now, Some(1)), to: now },
    }
  }

  /// Keep the observations that carry this period's label, preserving order.
  pub fn select(self, observations: Vec<Observation>) -> Vec<Observation> {
    let label = self.label();
    observations.into_iter().filter(|o| o.has_label(label)).collect()
  }
}

/// `now` minus `days`, saturating at the earliest representable timestamp.
/// `None` stands for a day count too large to represent.
fn days_before(now: NaiveDateTime, days: Option<i64>) -> NaiveDateTime {
  days
    .and_then(Duration::try_days)
    .and_then(|d| now.checked_sub_signed(d))
    .unwrap_or(NaiveDateTime::MIN)
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label().as_str())
  }
}
