//! CSV codec for epistat.
//!
//! Reads the case/death and vaccination exports into [`epistat_core`] records
//! and writes report rows back out. Pure synchronous; no database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! let input = "location,continent,date,population,total_cases\n\
//!              Chile,South America,2021-03-01,19116209,830000\n";
//! let cases = epistat_csv::read_cases(input.as_bytes()).unwrap();
//! assert_eq!(cases[0].location, "Chile");
//! ```

pub mod error;
mod read;
mod write;

pub use error::{Error, Result};
pub use read::{read_cases, read_vaccinations};
pub use write::{Tabular, write_rows};
