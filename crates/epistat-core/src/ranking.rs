//! Ranking and summary reports over the case/death table.
//!
//! Null handling differs from the vaccination rollup on purpose: here a null
//! count is ignored by `MAX`/`SUM`, not read as zero. A location whose deaths
//! are all null reports no death count rather than a count of zero.

use std::{cmp::Ordering, collections::BTreeMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  record::{CaseRecord, percent},
};

const TOTAL_CASES: &str = "total_cases";
const TOTAL_DEATHS: &str = "total_deaths";
const NEW_CASES: &str = "new_cases";
const NEW_DEATHS: &str = "new_deaths";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Countries with the highest infection rate compared to population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfectionRateRow {
  pub location:                    String,
  pub population:                  i64,
  pub highest_infection_count:     Option<i64>,
  pub percent_population_infected: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathCountRow {
  pub location:          String,
  pub total_death_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinentDeathRow {
  pub continent:         String,
  pub total_death_count: Option<i64>,
}

/// Worldwide new cases and deaths for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalDailyRow {
  pub date:             NaiveDate,
  pub total_cases:      Option<i64>,
  pub total_deaths:     Option<i64>,
  pub death_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalTotals {
  pub total_cases:      Option<i64>,
  pub total_deaths:     Option<i64>,
  pub death_percentage: Option<f64>,
}

/// Likelihood of dying once infected, per location and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathPercentageRow {
  pub location:         String,
  pub date:             NaiveDate,
  pub total_cases:      Option<i64>,
  pub total_deaths:     Option<i64>,
  pub death_percentage: Option<f64>,
}

/// Share of the population infected so far, per location and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfectionPercentageRow {
  pub location:                    String,
  pub date:                        NaiveDate,
  pub population:                  i64,
  pub total_cases:                 Option<i64>,
  pub percent_population_infected: Option<f64>,
}

// ─── Rankings ────────────────────────────────────────────────────────────────

/// Per `(location, population)`: the highest case count and the highest
/// `total_cases / population` share, sorted by that share descending.
pub fn infection_rate_ranking(cases: &[CaseRecord]) -> Result<Vec<InfectionRateRow>> {
  let mut groups: BTreeMap<(&str, i64), (Option<i64>, Option<f64>)> = BTreeMap::new();
  for case in cases {
    let count = case.total_cases.to_count(TOTAL_CASES)?;
    let share = case
      .total_cases
      .to_number(TOTAL_CASES)?
      .and_then(|n| ratio(n, case.population));

    let (max_count, max_share) = groups
      .entry((case.location.as_str(), case.population))
      .or_default();
    *max_count = max_opt(*max_count, count);
    *max_share = max_opt_f64(*max_share, share);
  }

  let mut rows: Vec<_> = groups
    .into_iter()
    .map(|((location, population), (count, share))| InfectionRateRow {
      location: location.to_owned(),
      population,
      highest_infection_count: count,
      percent_population_infected: share.map(|s| s * 100.0),
    })
    .collect();

  rows.sort_by(|a, b| {
    desc_nulls_last_f64(a.percent_population_infected, b.percent_population_infected)
      .then_with(|| a.location.cmp(&b.location))
  });
  Ok(rows)
}

/// Per location: the highest `total_deaths`, sorted descending. Aggregate
/// rows (no continent) are excluded.
pub fn death_count_ranking(cases: &[CaseRecord]) -> Result<Vec<DeathCountRow>> {
  let maxima = max_deaths_by(cases, |case| Some(case.location.as_str()))?;
  let mut rows: Vec<_> = maxima
    .into_iter()
    .map(|(location, total_death_count)| DeathCountRow {
      location: location.to_owned(),
      total_death_count,
    })
    .collect();
  rows.sort_by(|a, b| {
    desc_nulls_last(a.total_death_count, b.total_death_count)
      .then_with(|| a.location.cmp(&b.location))
  });
  Ok(rows)
}

/// Per continent: the highest `total_deaths` of any of its locations, sorted
/// descending.
pub fn continent_death_ranking(cases: &[CaseRecord]) -> Result<Vec<ContinentDeathRow>> {
  let maxima = max_deaths_by(cases, |case| case.continent.as_deref())?;
  let mut rows: Vec<_> = maxima
    .into_iter()
    .map(|(continent, total_death_count)| ContinentDeathRow {
      continent: continent.to_owned(),
      total_death_count,
    })
    .collect();
  rows.sort_by(|a, b| {
    desc_nulls_last(a.total_death_count, b.total_death_count)
      .then_with(|| a.continent.cmp(&b.continent))
  });
  Ok(rows)
}

fn max_deaths_by<'a, F>(cases: &'a [CaseRecord], key: F) -> Result<BTreeMap<&'a str, Option<i64>>>
where
  F: Fn(&'a CaseRecord) -> Option<&'a str>,
{
  let mut maxima: BTreeMap<&str, Option<i64>> = BTreeMap::new();
  for case in cases.iter().filter(|c| !c.is_aggregate()) {
    let Some(k) = key(case) else { continue };
    let deaths = case.total_deaths.to_count(TOTAL_DEATHS)?;
    let slot = maxima.entry(k).or_default();
    *slot = max_opt(*slot, deaths);
  }
  Ok(maxima)
}

// ─── Global numbers ──────────────────────────────────────────────────────────

/// Worldwide `sum(new_cases)` and `sum(new_deaths)` per date, over
/// non-aggregate rows, ordered by date.
pub fn global_numbers_by_date(cases: &[CaseRecord]) -> Result<Vec<GlobalDailyRow>> {
  let mut days: BTreeMap<NaiveDate, (Option<i64>, Option<i64>)> = BTreeMap::new();
  for case in cases.iter().filter(|c| !c.is_aggregate()) {
    let (new_cases, new_deaths) = daily_counts(case)?;
    let (sum_cases, sum_deaths) = days.entry(case.date).or_default();
    let partition = || case.date.to_string();
    *sum_cases = sum_opt(*sum_cases, new_cases, partition)?;
    *sum_deaths = sum_opt(*sum_deaths, new_deaths, partition)?;
  }

  Ok(
    days
      .into_iter()
      .map(|(date, (total_cases, total_deaths))| GlobalDailyRow {
        date,
        total_cases,
        total_deaths,
        death_percentage: fatality(total_cases, total_deaths),
      })
      .collect(),
  )
}

/// Worldwide `sum(new_cases)` and `sum(new_deaths)` over the whole dataset.
pub fn global_totals(cases: &[CaseRecord]) -> Result<GlobalTotals> {
  let mut total_cases = None;
  let mut total_deaths = None;
  for case in cases.iter().filter(|c| !c.is_aggregate()) {
    let (new_cases, new_deaths) = daily_counts(case)?;
    total_cases = sum_opt(total_cases, new_cases, || "World".to_owned())?;
    total_deaths = sum_opt(total_deaths, new_deaths, || "World".to_owned())?;
  }
  Ok(GlobalTotals {
    total_cases,
    total_deaths,
    death_percentage: fatality(total_cases, total_deaths),
  })
}

fn daily_counts(case: &CaseRecord) -> Result<(Option<i64>, Option<i64>)> {
  Ok((
    case.new_cases.to_count(NEW_CASES)?,
    case.new_deaths.to_count(NEW_DEATHS)?,
  ))
}

#[allow(clippy::cast_precision_loss)]
fn fatality(cases: Option<i64>, deaths: Option<i64>) -> Option<f64> {
  percent(deaths? as f64, cases? as f64)
}

// ─── Per-row series ──────────────────────────────────────────────────────────

/// `total_deaths / total_cases * 100` for every row whose location contains
/// `location_filter` (case-insensitive), ordered by location and date.
pub fn death_percentage_series(
  cases: &[CaseRecord],
  location_filter: Option<&str>,
) -> Result<Vec<DeathPercentageRow>> {
  let mut rows = Vec::new();
  for case in filtered(cases, location_filter) {
    let death_percentage = match (
      case.total_deaths.to_number(TOTAL_DEATHS)?,
      case.total_cases.to_number(TOTAL_CASES)?,
    ) {
      (Some(deaths), Some(total)) => percent(deaths, total),
      _ => None,
    };
    rows.push(DeathPercentageRow {
      location: case.location.clone(),
      date: case.date,
      total_cases: case.total_cases.to_count(TOTAL_CASES)?,
      total_deaths: case.total_deaths.to_count(TOTAL_DEATHS)?,
      death_percentage,
    });
  }
  rows.sort_by(|a, b| (&a.location, a.date).cmp(&(&b.location, b.date)));
  Ok(rows)
}

/// `total_cases / population * 100` for every row whose location contains
/// `location_filter` (case-insensitive), ordered by location and date.
pub fn infection_percentage_series(
  cases: &[CaseRecord],
  location_filter: Option<&str>,
) -> Result<Vec<InfectionPercentageRow>> {
  let mut rows = Vec::new();
  for case in filtered(cases, location_filter) {
    let share = case
      .total_cases
      .to_number(TOTAL_CASES)?
      .and_then(|n| ratio(n, case.population));
    rows.push(InfectionPercentageRow {
      location: case.location.clone(),
      date: case.date,
      population: case.population,
      total_cases: case.total_cases.to_count(TOTAL_CASES)?,
      percent_population_infected: share.map(|s| s * 100.0),
    });
  }
  rows.sort_by(|a, b| (&a.location, a.date).cmp(&(&b.location, b.date)));
  Ok(rows)
}

fn filtered<'a>(
  cases: &'a [CaseRecord],
  location_filter: Option<&str>,
) -> impl Iterator<Item = &'a CaseRecord> {
  let needle = location_filter.map(str::to_lowercase);
  cases.iter().filter(move |case| match &needle {
    Some(n) => case.location.to_lowercase().contains(n.as_str()),
    None => true,
  })
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: f64, population: i64) -> Option<f64> {
  (population != 0).then(|| numerator / population as f64)
}

fn max_opt(current: Option<i64>, next: Option<i64>) -> Option<i64> {
  match (current, next) {
    (Some(a), Some(b)) => Some(a.max(b)),
    (a, b) => a.or(b),
  }
}

fn max_opt_f64(current: Option<f64>, next: Option<f64>) -> Option<f64> {
  match (current, next) {
    (Some(a), Some(b)) => Some(a.max(b)),
    (a, b) => a.or(b),
  }
}

fn sum_opt<F>(current: Option<i64>, next: Option<i64>, partition: F) -> Result<Option<i64>>
where
  F: FnOnce() -> String,
{
  match (current, next) {
    (Some(a), Some(b)) => a
      .checked_add(b)
      .map(Some)
      .ok_or_else(|| Error::Overflow { partition: partition() }),
    (a, b) => Ok(a.or(b)),
  }
}

fn desc_nulls_last(a: Option<i64>, b: Option<i64>) -> Ordering {
  match (a, b) {
    (Some(x), Some(y)) => y.cmp(&x),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

fn desc_nulls_last_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
  match (a, b) {
    (Some(x), Some(y)) => y.total_cmp(&x),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}
