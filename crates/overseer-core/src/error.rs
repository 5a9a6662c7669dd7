//! Error types for `overseer-core`.

use thiserror::Error;
use uuid::Uuid;

/// Malformed caller input. Always recoverable by re-submitting corrected
/// values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("invalid price {0:?}: should contain not more than 10 symbols")]
  PriceTooLong(String),

  #[error("invalid price {0:?}: should be a positive float (without \"e\")")]
  InvalidPrice(String),

  #[error("invalid count {0}: should not be negative")]
  InvalidCount(i64),

  #[error("invalid period {0:?}: should be one of \"year\", \"month\", \"day\"")]
  InvalidPeriod(String),

  #[error("invalid year offset {0}: should not be negative")]
  InvalidYearOffset(i64),
}

/// The coarse category of an [`Error`], used by outer layers to pick a
/// response without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Transaction,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("observation not found: {0}")]
  ObservationNotFound(Uuid),

  #[error("item not found: {0}")]
  ItemNotFound(Uuid),

  /// The backing store could not complete or commit the operation. Nothing
  /// from the failed operation was applied.
  #[error("transaction failed: {0}")]
  Transaction(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::ObservationNotFound(_) | Self::ItemNotFound(_) => {
        ErrorKind::NotFound
      }
      Self::Transaction(_) => ErrorKind::Transaction,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
