//! `epistat`: load the case/death and vaccination exports into SQLite and run
//! reports over them.
//!
//! # Usage
//!
//! ```text
//! epistat import --cases CovidDeaths.csv --vaccinations CovidVaccinations.csv
//! epistat report vaccinations --format json --output vaccinated.json
//! epistat report death-percentage --location states
//! epistat materialize
//! ```

mod analysis;
mod output;
mod settings;

use std::{
  fs::File,
  io::{self, BufWriter, Read},
  path::{Path, PathBuf},
};

use analysis::{ReportKind, rolling_results, run_report};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use epistat_store_sqlite::SqliteStore;
use output::OutputFormat;
use settings::AppConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Vaccination rollout and outcome reports")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "epistat.toml")]
  config: PathBuf,

  /// Database path; overrides `database_path` from the config.
  #[arg(long, value_name = "FILE")]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Load the case/death and vaccination CSV exports into the database.
  Import {
    #[arg(long, value_name = "FILE")]
    cases:        PathBuf,
    #[arg(long, value_name = "FILE")]
    vaccinations: PathBuf,
  },

  /// Compute a report and write it to stdout or a file.
  Report {
    #[arg(value_enum)]
    kind:     ReportKind,
    /// Only locations containing this text (per-day series only).
    #[arg(long)]
    location: Option<String>,
    #[arg(long, value_enum)]
    format:   Option<OutputFormat>,
    #[arg(short, long, value_name = "FILE")]
    output:   Option<PathBuf>,
  },

  /// Recompute the percent_population_vaccinated table in the database.
  Materialize,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut cfg = AppConfig::load(&cli.config)?;
  if let Some(database) = cli.database {
    cfg.database_path = database;
  }

  match cli.command {
    Command::Import { cases, vaccinations } => import(&cfg, &cases, &vaccinations).await,
    Command::Report { kind, location, format, output } => {
      let store = SqliteStore::open_read_only(&cfg.database_path)
        .await
        .with_context(|| format!("failed to open store at {:?}", cfg.database_path))?;

      let report = run_report(&store, kind, location.as_deref()).await?;
      tracing::info!(?kind, rows = report.len(), "report computed");

      let format = format.unwrap_or(cfg.format);
      match output {
        Some(path) => {
          let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
          report.write(format, BufWriter::new(file))
        }
        None => report.write(format, io::stdout().lock()),
      }
    }
    Command::Materialize => {
      let store = open_store(&cfg.database_path).await?;
      let results = rolling_results(&store).await?;
      let written = store.materialize_rolling(results).await?;
      tracing::info!(rows = written, "percent_population_vaccinated refreshed");
      Ok(())
    }
  }
}

async fn open_store(path: &Path) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

async fn import(cfg: &AppConfig, cases: &Path, vaccinations: &Path) -> anyhow::Result<()> {
  let case_file = File::open(cases).with_context(|| format!("reading {}", cases.display()))?;
  let vaccination_file = File::open(vaccinations)
    .with_context(|| format!("reading {}", vaccinations.display()))?;

  let store = open_store(&cfg.database_path).await?;
  import_tables(&store, case_file, vaccination_file)
    .await
    .with_context(|| format!("importing {} and {}", cases.display(), vaccinations.display()))?;
  Ok(())
}

/// Parse both CSV tables and store them in a single transaction. Nothing is
/// written unless both parse and insert cleanly.
async fn import_tables<C: Read, V: Read>(
  store: &SqliteStore,
  cases: C,
  vaccinations: V,
) -> anyhow::Result<(usize, usize)> {
  let case_rows = epistat_csv::read_cases(cases).context("parsing case table")?;
  let vaccination_rows =
    epistat_csv::read_vaccinations(vaccinations).context("parsing vaccination table")?;

  store
    .import(case_rows, vaccination_rows)
    .await
    .context("import rolled back; the database is unchanged")
}

#[cfg(test)]
mod tests {
  use epistat_core::DatasetSource;

  use super::*;

  const CASES: &str = "\
location,continent,date,population,total_cases
Chile,South America,2021-03-01,19116209,830000
Chile,South America,2021-03-02,19116209,835000
";

  #[tokio::test]
  async fn import_is_all_or_nothing() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let duplicated = "location,date,new_vaccinations\n\
                      Chile,2021-03-01,100\n\
                      Chile,2021-03-01,200\n";
    let err = import_tables(&store, CASES.as_bytes(), duplicated.as_bytes())
      .await
      .unwrap_err();
    assert!(
      err
        .downcast_ref::<epistat_store_sqlite::Error>()
        .is_some_and(|e| matches!(e, epistat_store_sqlite::Error::DuplicateKey { .. }))
    );
    assert!(store.load_cases().await.unwrap().is_empty());
    assert!(store.load_vaccinations().await.unwrap().is_empty());

    let fixed = "location,date,new_vaccinations\n\
                 Chile,2021-03-01,100\n\
                 Chile,2021-03-02,200\n";
    let counts = import_tables(&store, CASES.as_bytes(), fixed.as_bytes())
      .await
      .unwrap();
    assert_eq!(counts, (2, 2));

    let rolled = analysis::rolling_results(&store).await.unwrap();
    let totals: Vec<_> = rolled.iter().map(|r| r.rolling_vaccinated).collect();
    assert_eq!(totals, vec![100, 300]);
  }

  #[tokio::test]
  async fn unparseable_vaccinations_write_nothing() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let bad = "location,date,new_vaccinations\nChile,someday,1\n";
    let err = import_tables(&store, CASES.as_bytes(), bad.as_bytes())
      .await
      .unwrap_err();
    assert!(err.downcast_ref::<epistat_csv::Error>().is_some());
    assert!(store.load_cases().await.unwrap().is_empty());
  }
}
