//! Record types for the two imported tables and the rows derived from them.
//!
//! Case and vaccination records are snapshots delivered by a loader and never
//! mutated. Joined records and rolling results are derived per run and
//! discarded once the output has been handed on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;

// ─── Imported tables ─────────────────────────────────────────────────────────

/// One row of the case/death table. At most one per `(location, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
  pub location:     String,
  /// `None` for aggregate rows (continents, income groups, "World") that the
  /// source mixes into the location column.
  pub continent:    Option<String>,
  pub date:         NaiveDate,
  pub population:   i64,
  pub total_cases:  Cell,
  pub new_cases:    Cell,
  pub total_deaths: Cell,
  pub new_deaths:   Cell,
}

impl CaseRecord {
  /// A record with every numeric column null.
  pub fn new(location: impl Into<String>, date: NaiveDate, population: i64) -> Self {
    Self {
      location: location.into(),
      continent: None,
      date,
      population,
      total_cases: Cell::Null,
      new_cases: Cell::Null,
      total_deaths: Cell::Null,
      new_deaths: Cell::Null,
    }
  }

  pub fn is_aggregate(&self) -> bool { self.continent.is_none() }
}

/// One row of the vaccination table. At most one per `(location, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationRecord {
  pub location:         String,
  pub date:             NaiveDate,
  pub new_vaccinations: Cell,
}

// ─── Derived rows ────────────────────────────────────────────────────────────

/// A case row matched with its vaccination row on `(location, date)`.
///
/// The keys are optional because joined rows may also be assembled by
/// callers; [`RollingAggregator`](crate::RollingAggregator) rejects rows
/// lacking either one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRecord {
  pub continent:        Option<String>,
  pub location:         Option<String>,
  pub date:             Option<NaiveDate>,
  pub population:       i64,
  pub new_vaccinations: Cell,
}

/// A joined row carrying the running vaccination total for its location.
///
/// Field order matches the column order of the percent-population-vaccinated
/// table handed to visualisation tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingResult {
  pub continent:          Option<String>,
  pub location:           String,
  pub date:               NaiveDate,
  pub population:         i64,
  pub new_vaccinations:   Option<i64>,
  pub rolling_vaccinated: i64,
}

impl RollingResult {
  /// `rolling_vaccinated / population * 100`, or `None` when the population
  /// is zero.
  #[allow(clippy::cast_precision_loss)]
  pub fn percent_population_vaccinated(&self) -> Option<f64> {
    percent(self.rolling_vaccinated as f64, self.population as f64)
  }
}

/// `numerator / denominator * 100`, `None` on a zero denominator.
pub(crate) fn percent(numerator: f64, denominator: f64) -> Option<f64> {
  (denominator != 0.0).then(|| numerator / denominator * 100.0)
}
