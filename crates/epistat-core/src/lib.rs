//! Core types and computations for epistat.
//!
//! This crate is deliberately free of file and database dependencies. It
//! holds the record types, the cell coercion rules, the `(location, date)`
//! join, the rolling vaccination aggregator and the ranking reports. Storage
//! backends and the CLI depend on it; it depends on nothing of theirs.

pub mod cell;
pub mod error;
pub mod join;
pub mod ranking;
pub mod record;
pub mod rolling;
pub mod source;

pub use cell::Cell;
pub use error::{Error, Result};
pub use join::join;
pub use record::{CaseRecord, JoinedRecord, RollingResult, VaccinationRecord};
pub use rolling::RollingAggregator;
pub use source::{DatasetSource, InMemoryDataset};
