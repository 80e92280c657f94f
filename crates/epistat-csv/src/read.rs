//! Header-driven readers for the two imported tables.
//!
//! Pipeline:
//!   raw bytes
//!     └─ csv::Reader            → StringRecord per line
//!          └─ Columns::resolve() → header name → index
//!               └─ typed cells   → CaseRecord / VaccinationRecord

use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use epistat_core::{CaseRecord, Cell, VaccinationRecord};

use crate::error::{Error, Result};

// ─── Column lookup ───────────────────────────────────────────────────────────

/// Resolved positions of the columns a reader cares about.
struct Columns {
  indices: Vec<Option<usize>>,
}

impl Columns {
  /// Locate `wanted` in `headers`, case-insensitively. Columns listed in
  /// `required` must be present.
  fn resolve(
    headers: &StringRecord,
    wanted: &[&'static str],
    required: &[&'static str],
  ) -> Result<Self> {
    let indices: Vec<Option<usize>> = wanted
      .iter()
      .map(|name| {
        headers
          .iter()
          .position(|h| h.trim().eq_ignore_ascii_case(name))
      })
      .collect();

    for name in required {
      let slot = wanted.iter().position(|w| w == name);
      if slot.and_then(|i| indices[i]).is_none() {
        return Err(Error::MissingColumn(name));
      }
    }
    Ok(Self { indices })
  }

  /// The raw field for wanted column `slot`, or `""` if the column is absent
  /// or the row is short.
  fn field<'r>(&self, record: &'r StringRecord, slot: usize) -> &'r str {
    self.indices[slot]
      .and_then(|i| record.get(i))
      .unwrap_or("")
  }
}

fn line_of(record: &StringRecord) -> u64 {
  record.position().map_or(0, csv::Position::line)
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
  ReaderBuilder::new()
    .trim(Trim::Headers)
    .flexible(true)
    .from_reader(input)
}

// ─── Field helpers ───────────────────────────────────────────────────────────

fn required_key(raw: &str, line: u64, field: &'static str) -> Result<String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(Error::MissingKey { line, field });
  }
  Ok(trimmed.to_owned())
}

/// Accepts ISO dates, US-style `M/D/YYYY`, and ISO timestamps with a space or
/// `T` separator (the time part is dropped).
fn parse_date(raw: &str, line: u64) -> Result<NaiveDate> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(Error::MissingKey { line, field: "date" });
  }
  NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
    .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
    .or_else(|_| timestamp_date(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
    .or_else(|_| timestamp_date(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
    .map_err(|_| Error::InvalidDate { line, value: trimmed.to_owned() })
}

fn timestamp_date(raw: &str, format: &str) -> chrono::ParseResult<NaiveDate> {
  NaiveDateTime::parse_from_str(raw, format).map(|dt| dt.date())
}

fn optional_text(raw: &str) -> Option<String> {
  let trimmed = raw.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Missing or blank population reads as zero, which downstream percentages
/// report as undefined.
fn population(raw: &str, line: u64) -> Result<i64> {
  Cell::from_text(raw)
    .to_count("population")
    .map(Option::unwrap_or_default)
    .map_err(|source| Error::Core { line, source })
}

// ─── Readers ─────────────────────────────────────────────────────────────────

const CASE_COLUMNS: [&str; 8] = [
  "location",
  "continent",
  "date",
  "population",
  "total_cases",
  "new_cases",
  "total_deaths",
  "new_deaths",
];

/// Read the case/death table. Columns are matched by header name; unknown
/// columns are ignored and missing numeric columns read as null.
pub fn read_cases<R: Read>(input: R) -> Result<Vec<CaseRecord>> {
  let mut rdr = reader(input);
  let columns = Columns::resolve(rdr.headers()?, &CASE_COLUMNS, &["location", "date"])?;

  let mut cases = Vec::new();
  for row in rdr.records() {
    let row = row?;
    let line = line_of(&row);
    cases.push(CaseRecord {
      location:     required_key(columns.field(&row, 0), line, "location")?,
      continent:    optional_text(columns.field(&row, 1)),
      date:         parse_date(columns.field(&row, 2), line)?,
      population:   population(columns.field(&row, 3), line)?,
      total_cases:  Cell::from_text(columns.field(&row, 4)),
      new_cases:    Cell::from_text(columns.field(&row, 5)),
      total_deaths: Cell::from_text(columns.field(&row, 6)),
      new_deaths:   Cell::from_text(columns.field(&row, 7)),
    });
  }
  Ok(cases)
}

const VACCINATION_COLUMNS: [&str; 3] = ["location", "date", "new_vaccinations"];

/// Read the vaccination table.
pub fn read_vaccinations<R: Read>(input: R) -> Result<Vec<VaccinationRecord>> {
  let mut rdr = reader(input);
  let columns =
    Columns::resolve(rdr.headers()?, &VACCINATION_COLUMNS, &["location", "date"])?;

  let mut vaccinations = Vec::new();
  for row in rdr.records() {
    let row = row?;
    let line = line_of(&row);
    vaccinations.push(VaccinationRecord {
      location:         required_key(columns.field(&row, 0), line, "location")?,
      date:             parse_date(columns.field(&row, 1), line)?,
      new_vaccinations: Cell::from_text(columns.field(&row, 2)),
    });
  }
  Ok(vaccinations)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  const DEATHS: &str = "\
iso_code,continent,location,date,population,total_cases,new_cases,total_deaths,new_deaths
AFG,Asia,Afghanistan,2020-02-24,38928341,1,1,,
AFG,Asia,Afghanistan,2020-02-25,38928341,1,0,,
OWID_WRL,,World,2020-02-25,7794798729,80000.0,900,2700,70
";

  #[test]
  fn reads_case_rows_by_header_name() {
    let cases = read_cases(DEATHS.as_bytes()).unwrap();
    assert_eq!(cases.len(), 3);

    let first = &cases[0];
    assert_eq!(first.location, "Afghanistan");
    assert_eq!(first.continent.as_deref(), Some("Asia"));
    assert_eq!(first.date, ymd(2020, 2, 24));
    assert_eq!(first.population, 38_928_341);
    assert_eq!(first.total_cases, Cell::Integer(1));
    assert_eq!(first.total_deaths, Cell::Null);

    let world = &cases[2];
    assert!(world.is_aggregate());
    assert_eq!(world.total_cases, Cell::Real(80_000.0));
    assert_eq!(world.new_deaths, Cell::Integer(70));
  }

  #[test]
  fn header_match_is_case_insensitive_and_optional_columns_default() {
    let input = "Location, DATE ,Population\nPeru,3/15/2021,33000000\n";
    let cases = read_cases(input.as_bytes()).unwrap();
    assert_eq!(cases[0].date, ymd(2021, 3, 15));
    assert_eq!(cases[0].continent, None);
    assert_eq!(cases[0].new_cases, Cell::Null);
  }

  #[test]
  fn missing_population_reads_as_zero() {
    let input = "location,date,population\nInternational,2021-01-01,\n";
    let cases = read_cases(input.as_bytes()).unwrap();
    assert_eq!(cases[0].population, 0);
  }

  #[test]
  fn malformed_population_is_a_coercion_error() {
    let input = "location,date,population\nPeru,2021-01-01,many\n";
    let err = read_cases(input.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::Core { line: 2, ref source } if source.is_coercion_error()));
  }

  #[test]
  fn missing_location_column_is_rejected() {
    let err = read_cases("date,population\n2021-01-01,1\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::MissingColumn("location")));
  }

  #[test]
  fn empty_location_is_a_missing_key() {
    let input = "location,date,new_vaccinations\n,2021-01-01,5\n";
    let err = read_vaccinations(input.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::MissingKey { line: 2, field: "location" }));
  }

  #[test]
  fn bad_date_is_reported_with_line() {
    let input = "location,date,new_vaccinations\nPeru,2021-01-01,5\nPeru,yesterday,1\n";
    let err = read_vaccinations(input.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::InvalidDate { line: 3, ref value } if value == "yesterday"));
  }

  #[test]
  fn timestamps_keep_only_the_date() {
    for raw in ["2021-06-30 12:00:00", "2021-06-30T00:00:00", "2021-06-30T23:59:59.5"] {
      assert_eq!(parse_date(raw, 2).unwrap(), ymd(2021, 6, 30), "{raw}");
    }
  }

  #[test]
  fn reads_vaccinations_keeping_malformed_counts() {
    let input = "\
location,date,new_vaccinations,people_vaccinated
Israel,2020-12-20,7000,
Israel,2020-12-21,,
Israel,2020-12-22,n/a,
Israel,2020-12-23 00:00:00.000,1200.0,
";
    let vaccinations = read_vaccinations(input.as_bytes()).unwrap();
    let cells: Vec<_> = vaccinations
      .iter()
      .map(|v| v.new_vaccinations.clone())
      .collect();
    assert_eq!(cells, vec![
      Cell::Integer(7000),
      Cell::Null,
      Cell::Text("n/a".into()),
      Cell::Real(1200.0),
    ]);
    assert_eq!(vaccinations[3].date, ymd(2020, 12, 23));
  }
}
