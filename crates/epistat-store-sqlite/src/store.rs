//! [`SqliteStore`]: the SQLite implementation of [`DatasetSource`].

use std::{collections::HashSet, path::Path};

use chrono::NaiveDate;
use rusqlite::{OpenFlags, types::Value};

use epistat_core::{CaseRecord, DatasetSource, RollingResult, VaccinationRecord};

use crate::{
  Error, Result,
  encode::{RawCase, RawMaterialized, RawVaccination, encode_cell, encode_date},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The analysis database: two imported tables plus the materialised
/// percent-population-vaccinated table.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// One row of `v_percent_population_vaccinated`.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedRow {
  pub result:                        RollingResult,
  pub percent_population_vaccinated: Option<f64>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an existing store without write access. The schema is assumed to
  /// be in place already.
  pub async fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_with_flags(
      path,
      OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .await?;
    Ok(Self { conn })
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Imports ───────────────────────────────────────────────────────────────

  /// Insert both tables in one transaction. A duplicate `(location, date)` in
  /// either batch, or against rows already stored, fails the whole import and
  /// leaves both tables untouched.
  pub async fn import(
    &self,
    cases: Vec<CaseRecord>,
    vaccinations: Vec<VaccinationRecord>,
  ) -> Result<(usize, usize)> {
    ensure_unique(cases.iter().map(|c| (c.location.as_str(), c.date)))?;
    ensure_unique(vaccinations.iter().map(|v| (v.location.as_str(), v.date)))?;
    let case_rows = case_rows(cases);
    let vaccination_rows = vaccination_rows(vaccinations);

    let counts = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_cases(&tx, &case_rows)?;
        insert_vaccinations(&tx, &vaccination_rows)?;
        tx.commit()?;
        Ok((case_rows.len(), vaccination_rows.len()))
      })
      .await?;

    tracing::info!(cases = counts.0, vaccinations = counts.1, "imported dataset");
    Ok(counts)
  }

  /// Insert case records in one transaction, with the same uniqueness rule
  /// as [`import`](Self::import).
  pub async fn import_cases(&self, cases: Vec<CaseRecord>) -> Result<usize> {
    ensure_unique(cases.iter().map(|c| (c.location.as_str(), c.date)))?;
    let rows = case_rows(cases);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_cases(&tx, &rows)?;
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    tracing::info!(rows = inserted, "imported case records");
    Ok(inserted)
  }

  /// Insert vaccination records in one transaction, with the same uniqueness
  /// rule as [`import`](Self::import).
  pub async fn import_vaccinations(&self, vaccinations: Vec<VaccinationRecord>) -> Result<usize> {
    ensure_unique(vaccinations.iter().map(|v| (v.location.as_str(), v.date)))?;
    let rows = vaccination_rows(vaccinations);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_vaccinations(&tx, &rows)?;
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    tracing::info!(rows = inserted, "imported vaccination records");
    Ok(inserted)
  }

  // ── Materialised view ─────────────────────────────────────────────────────

  /// Replace the contents of `percent_population_vaccinated` with `results`.
  pub async fn materialize_rolling(&self, results: Vec<RollingResult>) -> Result<usize> {
    let rows: Vec<(Option<String>, String, String, i64, Option<i64>, i64)> = results
      .into_iter()
      .map(|r| {
        (
          r.continent,
          r.location,
          encode_date(r.date),
          r.population,
          r.new_vaccinations,
          r.rolling_vaccinated,
        )
      })
      .collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM percent_population_vaccinated", [])?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO percent_population_vaccinated (
               continent, location, date, population,
               new_vaccinations, rolling_vaccinated
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![row.0, row.1, row.2, row.3, row.4, row.5])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    tracing::info!(rows = written, "materialised percent_population_vaccinated");
    Ok(written)
  }

  /// Read `v_percent_population_vaccinated` in location/date order.
  pub async fn load_materialized(&self) -> Result<Vec<MaterializedRow>> {
    let raws: Vec<RawMaterialized> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT continent, location, date, population, new_vaccinations,
                  rolling_vaccinated, percent_population_vaccinated
           FROM v_percent_population_vaccinated
           ORDER BY location, date",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawMaterialized {
              continent:          row.get(0)?,
              location:           row.get(1)?,
              date:               row.get(2)?,
              population:         row.get(3)?,
              new_vaccinations:   row.get(4)?,
              rolling_vaccinated: row.get(5)?,
              percent:            row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| {
        let (result, percent_population_vaccinated) = raw.into_parts()?;
        Ok(MaterializedRow { result, percent_population_vaccinated })
      })
      .collect()
  }
}

// ─── Insert helpers ──────────────────────────────────────────────────────────

type CaseRow = (String, Option<String>, String, i64, Value, Value, Value, Value);
type VaccinationRow = (String, String, Value);

fn case_rows(cases: Vec<CaseRecord>) -> Vec<CaseRow> {
  cases
    .into_iter()
    .map(|c| {
      (
        c.location,
        c.continent,
        encode_date(c.date),
        c.population,
        encode_cell(&c.total_cases),
        encode_cell(&c.new_cases),
        encode_cell(&c.total_deaths),
        encode_cell(&c.new_deaths),
      )
    })
    .collect()
}

fn vaccination_rows(vaccinations: Vec<VaccinationRecord>) -> Vec<VaccinationRow> {
  vaccinations
    .into_iter()
    .map(|v| (v.location, encode_date(v.date), encode_cell(&v.new_vaccinations)))
    .collect()
}

fn insert_cases(tx: &rusqlite::Transaction<'_>, rows: &[CaseRow]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO covid_deaths (
       location, continent, date, population,
       total_cases, new_cases, total_deaths, new_deaths
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7,
    ])?;
  }
  Ok(())
}

fn insert_vaccinations(
  tx: &rusqlite::Transaction<'_>,
  rows: &[VaccinationRow],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO covid_vaccinations (location, date, new_vaccinations)
     VALUES (?1, ?2, ?3)",
  )?;
  for (location, date, new_vaccinations) in rows {
    stmt.execute(rusqlite::params![location, date, new_vaccinations])?;
  }
  Ok(())
}

fn ensure_unique<'a>(keys: impl Iterator<Item = (&'a str, NaiveDate)>) -> Result<()> {
  let mut seen = HashSet::new();
  for (location, date) in keys {
    if !seen.insert((location, date)) {
      return Err(Error::DuplicateKey { location: location.to_owned(), date });
    }
  }
  Ok(())
}

// ─── DatasetSource impl ──────────────────────────────────────────────────────

impl DatasetSource for SqliteStore {
  type Error = Error;

  async fn load_cases(&self) -> Result<Vec<CaseRecord>> {
    let raws: Vec<RawCase> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT location, continent, date, population,
                  total_cases, new_cases, total_deaths, new_deaths
           FROM covid_deaths
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCase {
              location:     row.get(0)?,
              continent:    row.get(1)?,
              date:         row.get(2)?,
              population:   row.get(3)?,
              total_cases:  row.get(4)?,
              new_cases:    row.get(5)?,
              total_deaths: row.get(6)?,
              new_deaths:   row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(rows = raws.len(), "loaded covid_deaths");
    raws.into_iter().map(RawCase::into_record).collect()
  }

  async fn load_vaccinations(&self) -> Result<Vec<VaccinationRecord>> {
    let raws: Vec<RawVaccination> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT location, date, new_vaccinations
           FROM covid_vaccinations
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawVaccination {
              location:         row.get(0)?,
              date:             row.get(1)?,
              new_vaccinations: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(rows = raws.len(), "loaded covid_vaccinations");
    raws.into_iter().map(RawVaccination::into_record).collect()
  }
}
