//! Calendar arithmetic and input validation.
//!
//! Everything here is pure: no IO, no wall-clock reads.

use crate::{Result, ValidationError, period::Period};

/// Longest accepted price string, after normalisation.
pub const MAX_PRICE_LEN: usize = 10;

const MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

// ─── Calendar ────────────────────────────────────────────────────────────────

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
  (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 {
  if is_leap_year(year) { 366 } else { 365 }
}

/// Number of days in `month` (1-based). Returns `None` for a month outside
/// `1..=12`.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
  if month == 2 && is_leap_year(year) {
    return Some(29);
  }
  let index = usize::try_from(month.checked_sub(1)?).ok()?;
  MONTH_DAYS.get(index).copied()
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Parse a period token. Case-insensitive; surrounding whitespace is ignored.
pub fn validate_period(token: &str) -> Result<Period, ValidationError> {
  match token.trim().to_ascii_lowercase().as_str() {
    "year" => Ok(Period::Year),
    "month" => Ok(Period::Month),
    "day" => Ok(Period::Day),
    _ => Err(ValidationError::InvalidPeriod(token.to_owned())),
  }
}

pub fn validate_year_offset(offset: i64) -> Result<u64, ValidationError> {
  u64::try_from(offset).map_err(|_| ValidationError::InvalidYearOffset(offset))
}

/// Validate and normalise a price string.
///
/// A comma is accepted as the decimal separator and rewritten to `.`. The
/// result must be at most [`MAX_PRICE_LEN`] characters of ASCII digits and
/// dots that parses as a non-negative float.
pub fn validate_price(raw: &str) -> Result<String, ValidationError> {
  let price = raw.trim().replace(',', ".");
  if price.chars().count() > MAX_PRICE_LEN {
    return Err(ValidationError::PriceTooLong(raw.to_owned()));
  }

  let digits: String = price.chars().filter(|c| *c != '.').collect();
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return Err(ValidationError::InvalidPrice(raw.to_owned()));
  }
  // Catches repeated separators such as `1.2.3`.
  price
    .parse::<f64>()
    .map_err(|_| ValidationError::InvalidPrice(raw.to_owned()))?;

  Ok(price)
}

pub fn validate_count(count: i64) -> Result<i64, ValidationError> {
  if count >= 0 {
    Ok(count)
  } else {
    Err(ValidationError::InvalidCount(count))
  }
}
