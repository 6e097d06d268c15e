//! Error types for `gather-sync`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("event source error: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("event cache error: {0}")]
  Cache(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn from_source(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Source(Box::new(e))
  }

  pub(crate) fn from_cache(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Cache(Box::new(e))
  }
}

/// Failures of the bundled [`JsonFileSource`](crate::JsonFileSource).
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("cannot read {}: {source}", path.display())]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Payload(#[from] gather_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
