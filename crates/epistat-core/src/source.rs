//! The `DatasetSource` trait, a read-only handle onto the two imported
//! tables.
//!
//! Implemented by storage backends (e.g. `epistat-store-sqlite`). An analysis
//! run receives a source explicitly; nothing here is process-global.

use std::{convert::Infallible, future::Future};

use crate::record::{CaseRecord, VaccinationRecord};

/// Abstraction over wherever the case and vaccination tables live.
///
/// Both loads return full snapshots in storage order. Implementations must
/// not mutate the tables while a run holds the handle.
pub trait DatasetSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn load_cases(&self) -> impl Future<Output = Result<Vec<CaseRecord>, Self::Error>> + Send + '_;

  fn load_vaccinations(
    &self,
  ) -> impl Future<Output = Result<Vec<VaccinationRecord>, Self::Error>> + Send + '_;
}

/// A source over tables already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
  pub cases:        Vec<CaseRecord>,
  pub vaccinations: Vec<VaccinationRecord>,
}

impl InMemoryDataset {
  pub fn new(cases: Vec<CaseRecord>, vaccinations: Vec<VaccinationRecord>) -> Self {
    Self { cases, vaccinations }
  }
}

impl DatasetSource for InMemoryDataset {
  type Error = Infallible;

  async fn load_cases(&self) -> Result<Vec<CaseRecord>, Infallible> { Ok(self.cases.clone()) }

  async fn load_vaccinations(&self) -> Result<Vec<VaccinationRecord>, Infallible> {
    Ok(self.vaccinations.clone())
  }
}
