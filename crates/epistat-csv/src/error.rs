//! Error types for the epistat CSV codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("header has no `{0}` column")]
  MissingColumn(&'static str),

  /// A row lacks one of the keys every record must carry.
  #[error("line {line}: empty `{field}`")]
  MissingKey { line: u64, field: &'static str },

  #[error("line {line}: invalid date {value:?}")]
  InvalidDate { line: u64, value: String },

  #[error("line {line}: {source}")]
  Core {
    line:   u64,
    #[source]
    source: epistat_core::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
