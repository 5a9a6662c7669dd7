//! Wall-clock source for time-dependent operations.

use chrono::{Local, NaiveDateTime};

/// Supplies "now" as a naive local timestamp; no timezone is retained.
pub trait Clock: Send + Sync {
  fn now(&self) -> NaiveDateTime;
}

/// The process's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> NaiveDateTime { Local::now().naive_local() }
}

/// A clock frozen at one instant. Used by tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
  fn now(&self) -> NaiveDateTime { self.0 }
}
