//! The storage traits implemented by backends (e.g. `gather-store-sqlite`).
//!
//! The sync orchestrator and the binary depend on these abstractions, not on
//! any concrete backend.

use std::{future::Future, path::Path};

use crate::{
  event::Event,
  note::{AudioNote, NoteSlot},
};

// ─── Events ──────────────────────────────────────────────────────────────────

/// Durable cache of the events last received from the remote source.
///
/// The cache is never evicted by a sync: events are only ever overwritten by
/// id.
pub trait EventCache: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert or fully replace every event in `events`, keyed by id.
  ///
  /// All-or-nothing: if any record fails, none are written and the caller
  /// should retry the whole batch. An empty batch is a no-op.
  fn upsert_all(
    &self,
    events: Vec<Event>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Every cached event, most recent `date` first.
  fn get_all(&self) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// A single cached event, or `None` if the id is unknown.
  fn get<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + 'a;
}

// ─── Audio notes ─────────────────────────────────────────────────────────────

/// Holds at most one current voice memo per event.
pub trait AudioNoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Copy the finished recording at `source` into durable storage and make it
  /// the event's note, replacing any previous one.
  ///
  /// On error no note was saved, and the previous note (if any) is still
  /// intact. Callers should tell the user.
  fn store<'a>(
    &'a self,
    event_id: &'a str,
    source: &'a Path,
    duration_ms: Option<u64>,
  ) -> impl Future<Output = Result<AudioNote, Self::Error>> + Send + 'a;

  /// The event's current note, or `None`.
  fn get_latest<'a>(
    &'a self,
    event_id: &'a str,
  ) -> impl Future<Output = Result<Option<AudioNote>, Self::Error>> + Send + 'a;

  /// Remove the event's note and its backing file. Deleting a missing note is
  /// not an error.
  fn delete<'a>(
    &'a self,
    event_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The event's slot state, derived from [`AudioNoteStore::get_latest`].
  fn slot<'a>(
    &'a self,
    event_id: &'a str,
  ) -> impl Future<Output = Result<NoteSlot, Self::Error>> + Send + 'a {
    async move { Ok(NoteSlot::from(self.get_latest(event_id).await?)) }
  }
}
