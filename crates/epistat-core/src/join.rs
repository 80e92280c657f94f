//! Inner equijoin of the case and vaccination tables on `(location, date)`.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::record::{CaseRecord, JoinedRecord, VaccinationRecord};

/// Join `cases` with `vaccinations` on `(location, date)`.
///
/// Output follows case order; if the vaccination table breaks its uniqueness
/// invariant, each duplicate produces its own row, in vaccination order.
/// Rows with no partner on the other side are dropped.
pub fn join(cases: &[CaseRecord], vaccinations: &[VaccinationRecord]) -> Vec<JoinedRecord> {
  let mut index: HashMap<(&str, NaiveDate), Vec<&VaccinationRecord>> = HashMap::new();
  for vac in vaccinations {
    index
      .entry((vac.location.as_str(), vac.date))
      .or_default()
      .push(vac);
  }

  let mut joined = Vec::with_capacity(cases.len().min(vaccinations.len()));
  for case in cases {
    let Some(matches) = index.get(&(case.location.as_str(), case.date)) else {
      continue;
    };
    for vac in matches {
      joined.push(JoinedRecord {
        continent:        case.continent.clone(),
        location:         Some(case.location.clone()),
        date:             Some(case.date),
        population:       case.population,
        new_vaccinations: vac.new_vaccinations.clone(),
      });
    }
  }

  tracing::debug!(
    cases = cases.len(),
    vaccinations = vaccinations.len(),
    joined = joined.len(),
    "joined case and vaccination tables"
  );
  joined
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cell::Cell;

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2021, 3, d).unwrap() }

  fn vac(location: &str, d: u32, n: i64) -> VaccinationRecord {
    VaccinationRecord {
      location:         location.into(),
      date:             day(d),
      new_vaccinations: Cell::Integer(n),
    }
  }

  #[test]
  fn matches_on_location_and_date() {
    let mut case = CaseRecord::new("Chile", day(1), 19_000_000);
    case.continent = Some("South America".into());
    let cases = vec![case, CaseRecord::new("Chile", day(2), 19_000_000)];
    let vaccinations = vec![vac("Chile", 2, 50), vac("Chile", 1, 40), vac("Peru", 1, 9)];

    let joined = join(&cases, &vaccinations);
    assert_eq!(joined.len(), 2);
    assert_eq!(joined[0].date, Some(day(1)));
    assert_eq!(joined[0].new_vaccinations, Cell::Integer(40));
    assert_eq!(joined[0].continent.as_deref(), Some("South America"));
    assert_eq!(joined[1].date, Some(day(2)));
    assert_eq!(joined[1].new_vaccinations, Cell::Integer(50));
  }

  #[test]
  fn unmatched_rows_are_dropped() {
    let cases = vec![CaseRecord::new("Chile", day(1), 10)];
    let vaccinations = vec![vac("Chile", 2, 1)];
    assert!(join(&cases, &vaccinations).is_empty());
  }

  #[test]
  fn duplicate_vaccination_keys_fan_out() {
    let cases = vec![CaseRecord::new("Chile", day(1), 10)];
    let vaccinations = vec![vac("Chile", 1, 1), vac("Chile", 1, 2)];
    let joined = join(&cases, &vaccinations);
    let values: Vec<_> = joined.iter().map(|j| j.new_vaccinations.clone()).collect();
    assert_eq!(values, vec![Cell::Integer(1), Cell::Integer(2)]);
  }
}
