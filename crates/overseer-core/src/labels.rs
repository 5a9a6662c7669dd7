//! Label assignment: downsampling by tagging.
//!
//! Each new observation is tagged once, at write time, with the retention
//! tiers it represents. A coarse query then filters on a label instead of
//! aggregating the full history.
//!
//! Every tier is an independent check over its own lookback window. All three
//! checks look for a prior observation carrying [`Label::Day`]; the tiers
//! differ only in window length. Existing ledgers were labelled this way, so
//! changing the probed label would change query results for stored data.

use chrono::{Duration, NaiveDateTime};

use crate::observation::{Label, Labels, Observation};

/// One tier of the assigner: the label granted and the lookback it probes.
#[derive(Debug, Clone, Copy)]
struct Tier {
  label:    Label,
  lookback: Duration,
}

/// `day` every 15 minutes, `month` every 2 hours, `year` every day.
fn tiers() -> [Tier; 3] {
  [
    Tier { label: Label::Day, lookback: Duration::minutes(15) },
    Tier { label: Label::Month, lookback: Duration::hours(2) },
    Tier { label: Label::Year, lookback: Duration::days(1) },
  ]
}

/// The widest lookback of any tier. Stores read this much history before
/// calling [`assign_labels`].
pub fn max_lookback() -> Duration {
  tiers()
    .into_iter()
    .map(|t| t.lookback)
    .max()
    .unwrap_or_else(Duration::zero)
}

/// Decide the labels for an observation arriving at `now`.
///
/// `recent` holds the item's prior observations; rows outside a tier's window
/// `[now - lookback, now]` are ignored by that tier.
pub fn assign_labels(now: NaiveDateTime, recent: &[Observation]) -> Labels {
  tiers()
    .into_iter()
    .filter(|tier| {
      let from = now - tier.lookback;
      !recent.iter().any(|o| {
        o.registered_at >= from
          && o.registered_at <= now
          && o.has_label(Label::Day)
      })
    })
    .map(|tier| tier.label)
    .collect()
}
