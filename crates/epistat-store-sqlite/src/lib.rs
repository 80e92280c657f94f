//! SQLite backend for epistat: the database holding the two imported tables
//! and the materialised percent-population-vaccinated table.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{MaterializedRow, SqliteStore};
