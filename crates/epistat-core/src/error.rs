//! Error types for `epistat-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A record entering a computation lacks one of its grouping or ordering
  /// keys.
  #[error("record is missing required key field `{field}`")]
  MissingKey { field: &'static str },

  /// A numeric column holds content that cannot be read as a number.
  #[error("cannot coerce {value:?} in column `{column}` to a number")]
  TypeCoercion { column: &'static str, value: String },

  /// An integer sum left the `i64` range.
  #[error("sum over partition {partition:?} overflowed")]
  Overflow { partition: String },
}

impl Error {
  /// True for the missing-key family of failures (the data errors).
  pub fn is_data_error(&self) -> bool { matches!(self, Self::MissingKey { .. }) }

  pub fn is_coercion_error(&self) -> bool {
    matches!(self, Self::TypeCoercion { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
