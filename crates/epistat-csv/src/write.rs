//! Report rows → CSV.

use std::io::Write;

use epistat_core::{
  RollingResult,
  ranking::{
    ContinentDeathRow, DeathCountRow, DeathPercentageRow, GlobalDailyRow, GlobalTotals,
    InfectionPercentageRow, InfectionRateRow,
  },
};
use serde::Serialize;

use crate::Result;

/// A row type with a fixed column layout.
pub trait Tabular: Serialize {
  /// Header names, in field order.
  const COLUMNS: &'static [&'static str];
}

/// Write `rows` as CSV under a header of `T::COLUMNS`.
///
/// `None` fields become empty cells. An empty slice still gets its header.
pub fn write_rows<W: Write, T: Tabular>(output: W, rows: &[T]) -> Result<()> {
  let mut wtr = csv::WriterBuilder::new()
    .has_headers(false)
    .from_writer(output);
  wtr.write_record(T::COLUMNS)?;
  for row in rows {
    wtr.serialize(row)?;
  }
  wtr.flush()?;
  Ok(())
}

// ─── Column layouts ──────────────────────────────────────────────────────────

impl Tabular for RollingResult {
  const COLUMNS: &'static [&'static str] = &[
    "continent",
    "location",
    "date",
    "population",
    "new_vaccinations",
    "rolling_vaccinated",
  ];
}

impl Tabular for InfectionRateRow {
  const COLUMNS: &'static [&'static str] = &[
    "location",
    "population",
    "highest_infection_count",
    "percent_population_infected",
  ];
}

impl Tabular for DeathCountRow {
  const COLUMNS: &'static [&'static str] = &["location", "total_death_count"];
}

impl Tabular for ContinentDeathRow {
  const COLUMNS: &'static [&'static str] = &["continent", "total_death_count"];
}

impl Tabular for GlobalDailyRow {
  const COLUMNS: &'static [&'static str] =
    &["date", "total_cases", "total_deaths", "death_percentage"];
}

impl Tabular for GlobalTotals {
  const COLUMNS: &'static [&'static str] = &["total_cases", "total_deaths", "death_percentage"];
}

impl Tabular for DeathPercentageRow {
  const COLUMNS: &'static [&'static str] =
    &["location", "date", "total_cases", "total_deaths", "death_percentage"];
}

impl Tabular for InfectionPercentageRow {
  const COLUMNS: &'static [&'static str] = &[
    "location",
    "date",
    "population",
    "total_cases",
    "percent_population_infected",
  ];
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2021, 1, 13).unwrap() }

  /// `COLUMNS` must match the header serde derives from the struct fields.
  fn assert_columns_match_fields<T: Tabular>(row: T) {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.serialize(&row).unwrap();
    let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    let header = out.lines().next().unwrap();
    assert_eq!(header, T::COLUMNS.join(","));
  }

  #[test]
  fn column_layouts_follow_field_order() {
    assert_columns_match_fields(RollingResult {
      continent:          None,
      location:           "X".into(),
      date:               date(),
      population:         1,
      new_vaccinations:   None,
      rolling_vaccinated: 0,
    });
    assert_columns_match_fields(InfectionRateRow {
      location:                    "X".into(),
      population:                  1,
      highest_infection_count:     None,
      percent_population_infected: None,
    });
    assert_columns_match_fields(DeathCountRow { location: "X".into(), total_death_count: None });
    assert_columns_match_fields(ContinentDeathRow {
      continent:         "Asia".into(),
      total_death_count: None,
    });
    assert_columns_match_fields(GlobalDailyRow {
      date:             date(),
      total_cases:      None,
      total_deaths:     None,
      death_percentage: None,
    });
    assert_columns_match_fields(GlobalTotals {
      total_cases:      None,
      total_deaths:     None,
      death_percentage: None,
    });
    assert_columns_match_fields(DeathPercentageRow {
      location:         "X".into(),
      date:             date(),
      total_cases:      None,
      total_deaths:     None,
      death_percentage: None,
    });
    assert_columns_match_fields(InfectionPercentageRow {
      location:                    "X".into(),
      date:                        date(),
      population:                  1,
      total_cases:                 None,
      percent_population_infected: None,
    });
  }

  #[test]
  fn writes_rolling_results_in_view_column_order() {
    let rows = vec![RollingResult {
      continent:          Some("Europe".into()),
      location:           "Albania".into(),
      date:               date(),
      population:         2_877_800,
      new_vaccinations:   None,
      rolling_vaccinated: 60,
    }];
    let mut out = Vec::new();
    write_rows(&mut out, &rows).unwrap();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "continent,location,date,population,new_vaccinations,rolling_vaccinated\n\
       Europe,Albania,2021-01-13,2877800,,60\n"
    );
  }

  #[test]
  fn unknown_counts_are_empty_cells() {
    let rows = vec![DeathCountRow { location: "Niue".into(), total_death_count: None }];
    let mut out = Vec::new();
    write_rows(&mut out, &rows).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "location,total_death_count\nNiue,\n");
  }

  #[test]
  fn empty_input_still_writes_header() {
    let mut out = Vec::new();
    write_rows::<_, DeathCountRow>(&mut out, &[]).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "location,total_death_count\n");
  }
}
