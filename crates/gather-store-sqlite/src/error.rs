//! Error type for `gather-store-sqlite`.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] gather_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("i/o error at {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The recording handed to the audio store is not on disk.
  #[error("recording not found: {}", .0.display())]
  SourceMissing(PathBuf),

  #[error("database schema version {found} is newer than supported version {supported}")]
  SchemaTooNew { found: i64, supported: i64 },

  #[error("invalid created_at timestamp: {0}")]
  Timestamp(i64),
}

impl Error {
  pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
    Self::Io { path: path.as_ref().to_path_buf(), source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
