//! Runtime configuration: defaults, then `epistat.toml` (or `--config`), then
//! `EPISTAT_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

use crate::output::OutputFormat;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// SQLite database holding the imported tables. A leading `~/` expands to
  /// `$HOME`.
  pub database_path: PathBuf,
  /// Default format for `report` when `--format` is not given.
  pub format:        OutputFormat,
}

impl AppConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("database_path", "epistat.db")?
      .set_default("format", "csv")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("EPISTAT"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")?;
    cfg.database_path = expand_tilde(&cfg.database_path);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let cfg = AppConfig::load(Path::new("/nonexistent/epistat.toml")).unwrap();
    assert_eq!(cfg.format, OutputFormat::Csv);
    assert!(cfg.database_path.ends_with("epistat.db"));
  }

  #[test]
  fn paths_without_tilde_are_untouched() {
    assert_eq!(expand_tilde(Path::new("/data/x.db")), PathBuf::from("/data/x.db"));
  }
}
