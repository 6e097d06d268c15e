//! Runtime settings, layered from defaults, an optional TOML file and
//! `GATHER_*` environment variables (highest precedence).

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite file holding the event cache and audio-note rows.
  pub database_path:  PathBuf,
  /// Directory owned by the audio store for durable recording copies.
  pub recordings_dir: PathBuf,
  /// JSON file standing in for the remote event feed.
  pub events_source:  PathBuf,
}

impl Settings {
  pub fn load(config_file: &Path) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .set_default("database_path", "gather.db")?
      .set_default("recordings_dir", "recordings")?
      .set_default("events_source", "events.json")?
      .add_source(config::File::from(config_file).required(false))
      .add_source(config::Environment::with_prefix("GATHER"))
      .build()
      .with_context(|| format!("failed to read config file {}", config_file.display()))?;

    let settings: Settings = raw
      .try_deserialize()
      .context("failed to deserialise settings")?;

    Ok(Self {
      database_path:  expand_tilde(&settings.database_path),
      recordings_dir: expand_tilde(&settings.recordings_dir),
      events_source:  expand_tilde(&settings.events_source),
    })
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  match (s.strip_prefix("~/"), std::env::var("HOME")) {
    (Some(rest), Ok(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let s = Settings::load(Path::new("/nonexistent/gather.toml")).unwrap();
    assert_eq!(s.recordings_dir, PathBuf::from("recordings"));
    assert_eq!(s.events_source, PathBuf::from("events.json"));
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("gather.toml");
    std::fs::write(&file, "recordings_dir = \"/var/lib/gather/recordings\"\n").unwrap();

    let s = Settings::load(&file).unwrap();
    assert_eq!(s.recordings_dir, PathBuf::from("/var/lib/gather/recordings"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/gather.db")), PathBuf::from(home).join("gather.db"));
    assert_eq!(expand_tilde(Path::new("/abs/gather.db")), PathBuf::from("/abs/gather.db"));
  }
}
