//! The mocked remote: events bundled as a JSON file.

use std::path::{Path, PathBuf};

use gather_core::{
  event::{parse_events, Event},
  source::EventSource,
};

use crate::SourceError;

/// Reads the full event list from a JSON array on disk on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
  path: PathBuf,
}

impl JsonFileSource {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }
}

impl EventSource for JsonFileSource {
  type Error = SourceError;

  async fn fetch_events(&self) -> Result<Vec<Event>, SourceError> {
    let raw = tokio::fs::read_to_string(&self.path)
      .await
      .map_err(|source| SourceError::Read { path: self.path.clone(), source })?;
    let events = parse_events(&raw)?;
    tracing::debug!(path = %self.path.display(), count = events.len(), "read events file");
    Ok(events)
  }
}
