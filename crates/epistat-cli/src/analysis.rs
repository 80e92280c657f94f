//! One analysis run: load both tables from a [`DatasetSource`], compute the
//! requested report, hand back rows ready for output.

use std::io::Write;

use chrono::NaiveDate;
use clap::ValueEnum;
use epistat_core::{
  DatasetSource, RollingAggregator, RollingResult, join,
  ranking::{
    self, ContinentDeathRow, DeathCountRow, DeathPercentageRow, GlobalDailyRow,
    GlobalTotals, InfectionPercentageRow, InfectionRateRow,
  },
};
use epistat_csv::Tabular;
use serde::Serialize;

use crate::output::{OutputFormat, emit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
  /// Rolling vaccinations per location with percent of population.
  Vaccinations,
  /// Locations by highest share of population infected.
  InfectionRate,
  /// Locations by highest death count.
  DeathCount,
  /// Continents by highest death count.
  ContinentDeaths,
  /// Worldwide new cases and deaths per day.
  GlobalDaily,
  /// Worldwide new cases and deaths over the whole dataset.
  GlobalTotals,
  /// Likelihood of dying once infected, per location and day.
  DeathPercentage,
  /// Share of population infected, per location and day.
  InfectionPercentage,
}

/// A row of the percent-population-vaccinated output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaccinationRow {
  pub continent:                     Option<String>,
  pub location:                      String,
  pub date:                          NaiveDate,
  pub population:                    i64,
  pub new_vaccinations:              Option<i64>,
  pub rolling_vaccinated:            i64,
  pub percent_population_vaccinated: Option<f64>,
}

impl From<RollingResult> for VaccinationRow {
  fn from(r: RollingResult) -> Self {
    let percent_population_vaccinated = r.percent_population_vaccinated();
    Self {
      continent: r.continent,
      location: r.location,
      date: r.date,
      population: r.population,
      new_vaccinations: r.new_vaccinations,
      rolling_vaccinated: r.rolling_vaccinated,
      percent_population_vaccinated,
    }
  }
}

impl Tabular for VaccinationRow {
  const COLUMNS: &'static [&'static str] = &[
    "continent",
    "location",
    "date",
    "population",
    "new_vaccinations",
    "rolling_vaccinated",
    "percent_population_vaccinated",
  ];
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
  Vaccinations(Vec<VaccinationRow>),
  InfectionRate(Vec<InfectionRateRow>),
  DeathCount(Vec<DeathCountRow>),
  ContinentDeaths(Vec<ContinentDeathRow>),
  GlobalDaily(Vec<GlobalDailyRow>),
  GlobalTotals(GlobalTotals),
  DeathPercentage(Vec<DeathPercentageRow>),
  InfectionPercentage(Vec<InfectionPercentageRow>),
}

impl Report {
  pub fn len(&self) -> usize {
    match self {
      Self::Vaccinations(rows) => rows.len(),
      Self::InfectionRate(rows) => rows.len(),
      Self::DeathCount(rows) => rows.len(),
      Self::ContinentDeaths(rows) => rows.len(),
      Self::GlobalDaily(rows) => rows.len(),
      Self::GlobalTotals(_) => 1,
      Self::DeathPercentage(rows) => rows.len(),
      Self::InfectionPercentage(rows) => rows.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn write<W: Write>(&self, format: OutputFormat, out: W) -> anyhow::Result<()> {
    match self {
      Self::Vaccinations(rows) => emit(rows, format, out),
      Self::InfectionRate(rows) => emit(rows, format, out),
      Self::DeathCount(rows) => emit(rows, format, out),
      Self::ContinentDeaths(rows) => emit(rows, format, out),
      Self::GlobalDaily(rows) => emit(rows, format, out),
      Self::GlobalTotals(totals) => emit(std::slice::from_ref(totals), format, out),
      Self::DeathPercentage(rows) => emit(rows, format, out),
      Self::InfectionPercentage(rows) => emit(rows, format, out),
    }
  }
}

/// Join both tables and roll up vaccinations per location.
pub async fn rolling_results<S: DatasetSource>(source: &S) -> anyhow::Result<Vec<RollingResult>> {
  let cases = source.load_cases().await?;
  let vaccinations = source.load_vaccinations().await?;
  let results = RollingAggregator::new().aggregate(&join(&cases, &vaccinations))?;
  Ok(results)
}

/// Compute `kind` against `source`. `location` restricts the per-day series
/// to locations containing that text.
pub async fn run_report<S: DatasetSource>(
  source: &S,
  kind: ReportKind,
  location: Option<&str>,
) -> anyhow::Result<Report> {
  let cases = source.load_cases().await?;
  let report = match kind {
    ReportKind::Vaccinations => {
      let vaccinations = source.load_vaccinations().await?;
      let rows = RollingAggregator::new().aggregate(&join(&cases, &vaccinations))?;
      Report::Vaccinations(rows.into_iter().map(VaccinationRow::from).collect())
    }
    ReportKind::InfectionRate => Report::InfectionRate(ranking::infection_rate_ranking(&cases)?),
    ReportKind::DeathCount => Report::DeathCount(ranking::death_count_ranking(&cases)?),
    ReportKind::ContinentDeaths => {
      Report::ContinentDeaths(ranking::continent_death_ranking(&cases)?)
    }
    ReportKind::GlobalDaily => Report::GlobalDaily(ranking::global_numbers_by_date(&cases)?),
    ReportKind::GlobalTotals => Report::GlobalTotals(ranking::global_totals(&cases)?),
    ReportKind::DeathPercentage => {
      Report::DeathPercentage(ranking::death_percentage_series(&cases, location)?)
    }
    ReportKind::InfectionPercentage => {
      Report::InfectionPercentage(ranking::infection_percentage_series(&cases, location)?)
    }
  };
  Ok(report)
}
