//! Loosely typed tabular cells and their numeric coercion rules.
//!
//! Imported datasets carry numeric columns whose storage type is not
//! trustworthy: counts arrive as integers, as floats, as text, or not at all.
//! Cells keep whatever the loader saw and are coerced only when a
//! computation needs the number, so malformed content is reported against
//! the column that holds it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single value from an imported table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
  #[default]
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Cell {
  /// Type a raw text cell the way a loader reads a delimited file: empty is
  /// null, integers and floats are recognised, anything else stays text.
  pub fn from_text(raw: &str) -> Self {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Self::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
      return Self::Integer(i);
    }
    match trimmed.parse::<f64>() {
      Ok(f) if f.is_finite() => Self::Real(f),
      _ => Self::Text(raw.to_owned()),
    }
  }

  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// Coerce to an integer count. Fractional values truncate toward zero.
  ///
  /// `Ok(None)` means the cell is null (or blank text); callers decide what
  /// null means for their computation.
  pub fn to_count(&self, column: &'static str) -> Result<Option<i64>> {
    match self {
      Self::Null => Ok(None),
      Self::Integer(i) => Ok(Some(*i)),
      Self::Real(f) => truncate(*f).map(Some).ok_or_else(|| self.coercion_error(column)),
      Self::Text(s) => {
        let trimmed = s.trim();
        if trimmed.is_empty() {
          return Ok(None);
        }
        if let Ok(i) = trimmed.parse::<i64>() {
          return Ok(Some(i));
        }
        trimmed
          .parse::<f64>()
          .ok()
          .and_then(truncate)
          .map(Some)
          .ok_or_else(|| self.coercion_error(column))
      }
    }
  }

  /// Coerce to a floating-point number for ratio computations.
  pub fn to_number(&self, column: &'static str) -> Result<Option<f64>> {
    match self {
      Self::Null => Ok(None),
      #[allow(clippy::cast_precision_loss)]
      Self::Integer(i) => Ok(Some(*i as f64)),
      Self::Real(f) if f.is_finite() => Ok(Some(*f)),
      Self::Real(_) => Err(self.coercion_error(column)),
      Self::Text(s) => {
        let trimmed = s.trim();
        if trimmed.is_empty() {
          return Ok(None);
        }
        match trimmed.parse::<f64>() {
          Ok(f) if f.is_finite() => Ok(Some(f)),
          _ => Err(self.coercion_error(column)),
        }
      }
    }
  }

  fn coercion_error(&self, column: &'static str) -> Error {
    Error::TypeCoercion { column, value: self.to_string() }
  }
}

/// Truncate toward zero, refusing values that do not fit an `i64`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(f: f64) -> Option<i64> {
  if !f.is_finite() {
    return None;
  }
  let t = f.trunc();
  // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
  (t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

impl fmt::Display for Cell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => f.write_str("NULL"),
      Self::Integer(i) => write!(f, "{i}"),
      Self::Real(r) => write!(f, "{r}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

impl From<i64> for Cell {
  fn from(value: i64) -> Self { Self::Integer(value) }
}

impl From<Option<i64>> for Cell {
  fn from(value: Option<i64>) -> Self { value.map_or(Self::Null, Self::Integer) }
}

impl From<f64> for Cell {
  fn from(value: f64) -> Self { Self::Real(value) }
}

impl From<&str> for Cell {
  fn from(value: &str) -> Self { Self::Text(value.to_owned()) }
}
