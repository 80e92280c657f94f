//! Encoding and decoding helpers between epistat record types and SQLite
//! values.
//!
//! Dates are stored as ISO 8601 `YYYY-MM-DD` text. Count cells map one-to-one
//! onto SQLite's dynamic storage classes.

use chrono::NaiveDate;
use epistat_core::{CaseRecord, Cell, RollingResult, VaccinationRecord};
use rusqlite::types::Value;

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Cell ────────────────────────────────────────────────────────────────────

pub fn encode_cell(cell: &Cell) -> Value {
  match cell {
    Cell::Null => Value::Null,
    Cell::Integer(i) => Value::Integer(*i),
    Cell::Real(f) => Value::Real(*f),
    Cell::Text(s) => Value::Text(s.clone()),
  }
}

pub fn decode_cell(value: Value, column: &'static str) -> Result<Cell> {
  match value {
    Value::Null => Ok(Cell::Null),
    Value::Integer(i) => Ok(Cell::Integer(i)),
    Value::Real(f) => Ok(Cell::Real(f)),
    Value::Text(s) => Ok(Cell::Text(s)),
    Value::Blob(_) => Err(Error::UnsupportedValue(column)),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `covid_deaths` row.
pub struct RawCase {
  pub location:     String,
  pub continent:    Option<String>,
  pub date:         String,
  pub population:   Value,
  pub total_cases:  Value,
  pub new_cases:    Value,
  pub total_deaths: Value,
  pub new_deaths:   Value,
}

impl RawCase {
  pub fn into_record(self) -> Result<CaseRecord> {
    let population = decode_cell(self.population, "population")?
      .to_count("population")?
      .unwrap_or_default();
    Ok(CaseRecord {
      location: self.location,
      continent: self.continent,
      date: decode_date(&self.date)?,
      population,
      total_cases: decode_cell(self.total_cases, "total_cases")?,
      new_cases: decode_cell(self.new_cases, "new_cases")?,
      total_deaths: decode_cell(self.total_deaths, "total_deaths")?,
      new_deaths: decode_cell(self.new_deaths, "new_deaths")?,
    })
  }
}

/// Raw values read directly from a `covid_vaccinations` row.
pub struct RawVaccination {
  pub location:         String,
  pub date:             String,
  pub new_vaccinations: Value,
}

impl RawVaccination {
  pub fn into_record(self) -> Result<VaccinationRecord> {
    Ok(VaccinationRecord {
      location:         self.location,
      date:             decode_date(&self.date)?,
      new_vaccinations: decode_cell(self.new_vaccinations, "new_vaccinations")?,
    })
  }
}

/// Raw values read from `v_percent_population_vaccinated`.
pub struct RawMaterialized {
  pub continent:          Option<String>,
  pub location:           String,
  pub date:               String,
  pub population:         i64,
  pub new_vaccinations:   Option<i64>,
  pub rolling_vaccinated: i64,
  pub percent:            Option<f64>,
}

impl RawMaterialized {
  pub fn into_parts(self) -> Result<(RollingResult, Option<f64>)> {
    let result = RollingResult {
      continent:          self.continent,
      location:           self.location,
      date:               decode_date(&self.date)?,
      population:         self.population,
      new_vaccinations:   self.new_vaccinations,
      rolling_vaccinated: self.rolling_vaccinated,
    };
    Ok((result, self.percent))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_round_trip_as_iso_text() {
    let date = NaiveDate::from_ymd_opt(2021, 2, 3).unwrap();
    assert_eq!(encode_date(date), "2021-02-03");
    assert_eq!(decode_date("2021-02-03").unwrap(), date);
    assert!(matches!(decode_date("02/03/2021"), Err(Error::DateParse(_))));
  }

  #[test]
  fn blobs_are_rejected() {
    let err = decode_cell(Value::Blob(vec![1]), "new_cases").unwrap_err();
    assert!(matches!(err, Error::UnsupportedValue("new_cases")));
  }
}
