//! Rendering report rows as CSV or JSON.

use std::io::Write;

use anyhow::Context as _;
use clap::ValueEnum;
use epistat_csv::Tabular;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
  Csv,
  Json,
}

/// Write `rows` to `out` in `format`. CSV always carries a header; JSON output
/// is a pretty-printed array followed by a newline.
pub fn emit<T: Tabular, W: Write>(rows: &[T], format: OutputFormat, mut out: W) -> anyhow::Result<()> {
  match format {
    OutputFormat::Csv => epistat_csv::write_rows(out, rows).context("writing csv")?,
    OutputFormat::Json => {
      serde_json::to_writer_pretty(&mut out, rows).context("writing json")?;
      writeln!(out)?;
      out.flush()?;
    }
  }
  Ok(())
}
