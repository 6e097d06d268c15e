//! Audio notes: one voice memo attached to one event.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted voice memo. The backing file is a durable copy owned by the
/// store; the recording subsystem's temporary file is never referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioNote {
  /// Auto-incrementing row id.
  pub id:          i64,
  pub event_id:    String,
  pub file_path:   PathBuf,
  pub duration_ms: Option<u64>,
  /// Store-assigned; the newest note for an event is the current one.
  pub created_at:  DateTime<Utc>,
}

/// The audio-note slot of a single event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "note", rename_all = "snake_case")]
pub enum NoteSlot {
  Empty,
  Recorded(AudioNote),
}

impl NoteSlot {
  pub fn is_recorded(&self) -> bool { matches!(self, Self::Recorded(_)) }

  pub fn note(&self) -> Option<&AudioNote> {
    match self {
      Self::Empty => None,
      Self::Recorded(note) => Some(note),
    }
  }
}

impl From<Option<AudioNote>> for NoteSlot {
  fn from(note: Option<AudioNote>) -> Self {
    note.map_or(Self::Empty, Self::Recorded)
  }
}
