//! Error type for `epistat-store-sqlite`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] epistat_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// An import batch holds two rows for the same `(location, date)`.
  #[error("duplicate row for {location:?} on {date}")]
  DuplicateKey { location: String, date: NaiveDate },

  #[error("unsupported value in column `{0}`")]
  UnsupportedValue(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
