//! Error types for `gather-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("event has an empty id")]
  EmptyEventId,

  #[error("audio note requested for an empty event id")]
  EmptyNoteEventId,

  #[error("malformed event payload: {0}")]
  Payload(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
