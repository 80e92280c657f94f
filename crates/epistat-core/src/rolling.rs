//! Per-location running vaccination totals.
//!
//! Equivalent to `SUM(new_vaccinations) OVER (PARTITION BY location ORDER BY
//! date)`, computed as group → stable sort → scan.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
  Error, Result,
  record::{JoinedRecord, RollingResult},
};

const NEW_VACCINATIONS: &str = "new_vaccinations";

/// Computes cumulative `new_vaccinations` per location.
///
/// Stateless; one aggregator can serve any number of runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingAggregator;

impl RollingAggregator {
  pub fn new() -> Self { Self }

  /// Produce one [`RollingResult`] per input record, ordered by location and
  /// then date.
  ///
  /// Null vaccination counts add zero. Records sharing a `(location, date)`
  /// keep their relative input order. Any record without a location or date,
  /// or with a non-numeric vaccination count, fails the whole run.
  pub fn aggregate(&self, records: &[JoinedRecord]) -> Result<Vec<RollingResult>> {
    let mut partitions: BTreeMap<&str, Vec<(NaiveDate, &JoinedRecord)>> = BTreeMap::new();
    for record in records {
      let location = record
        .location
        .as_deref()
        .ok_or(Error::MissingKey { field: "location" })?;
      let date = record.date.ok_or(Error::MissingKey { field: "date" })?;
      partitions.entry(location).or_default().push((date, record));
    }

    let mut results = Vec::with_capacity(records.len());
    for (location, mut rows) in partitions {
      // Stable: equal dates keep input order.
      rows.sort_by_key(|(date, _)| *date);

      let mut running: i64 = 0;
      for (date, record) in rows {
        let increment = record.new_vaccinations.to_count(NEW_VACCINATIONS)?;
        running = running
          .checked_add(increment.unwrap_or(0))
          .ok_or_else(|| Error::Overflow { partition: location.to_owned() })?;

        results.push(RollingResult {
          continent: record.continent.clone(),
          location: location.to_owned(),
          date,
          population: record.population,
          new_vaccinations: increment,
          rolling_vaccinated: running,
        });
      }
      tracing::debug!(location, total = running, "rolled up partition");
    }

    Ok(results)
  }
}
