//! Error type for `overseer-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("observation not found: {0}")]
  ObservationNotFound(uuid::Uuid),

  #[error("item not found: {0}")]
  ItemNotFound(uuid::Uuid),
}

impl From<Error> for overseer_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::ObservationNotFound(id) => Self::ObservationNotFound(id),
      Error::ItemNotFound(id) => Self::ItemNotFound(id),
      other => Self::Transaction(Box::new(other)),
    }
  }
}

/// Carry a decoding failure out of a `tokio_rusqlite` closure.
pub(crate) fn in_call(e: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
