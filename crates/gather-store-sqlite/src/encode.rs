//! Conversions between domain types and SQLite column values.
//!
//! Text and coordinate columns are read as nullable even though the current
//! schema declares them `NOT NULL`: tables carried over from before schema
//! versioning may still hold NULLs, and those read back as the storage
//! default. Timestamps are epoch milliseconds.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use gather_core::{event::Event, note::AudioNote};
use rusqlite::Row;

use crate::{Error, Result};

// ─── Events ──────────────────────────────────────────────────────────────────

/// Column list shared by every event SELECT, in [`event_from_row`] order.
pub const EVENT_COLUMNS: &str = "id, title, date, startTime, endTime, place, host, address, \
   lat, lon, about, bring, culture, location, organizer";

fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
  Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn real(row: &Row<'_>, idx: usize) -> rusqlite::Result<f64> {
  Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or_default())
}

pub fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
  Ok(Event {
    id:         row.get(0)?,
    title:      text(row, 1)?,
    date:       text(row, 2)?,
    start_time: text(row, 3)?,
    end_time:   text(row, 4)?,
    place:      text(row, 5)?,
    host:       text(row, 6)?,
    address:    text(row, 7)?,
    lat:        real(row, 8)?,
    lon:        real(row, 9)?,
    about:      text(row, 10)?,
    bring:      text(row, 11)?,
    culture:    text(row, 12)?,
    location:   text(row, 13)?,
    organizer:  text(row, 14)?,
  })
}

// ─── Timestamps and durations ────────────────────────────────────────────────

pub fn encode_millis(dt: DateTime<Utc>) -> i64 { dt.timestamp_millis() }

pub fn decode_millis(ms: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_millis(ms).ok_or(Error::Timestamp(ms))
}

pub fn encode_duration(ms: Option<u64>) -> Option<i64> {
  ms.map(|ms| i64::try_from(ms).unwrap_or(i64::MAX))
}

// ─── Audio notes ─────────────────────────────────────────────────────────────

pub const NOTE_COLUMNS: &str = "id, event_id, file_uri, duration_ms, created_at";

/// An `audio_notes` row before timestamp decoding.
pub struct RawNote {
  pub id:          i64,
  pub event_id:    String,
  pub file_uri:    String,
  pub duration_ms: Option<i64>,
  pub created_at:  Option<i64>,
}

impl RawNote {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      event_id:    row.get(1)?,
      file_uri:    row.get(2)?,
      duration_ms: row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_note(self) -> Result<AudioNote> {
    Ok(AudioNote {
      id:          self.id,
      event_id:    self.event_id,
      file_path:   PathBuf::from(self.file_uri),
      duration_ms: self.duration_ms.and_then(|ms| u64::try_from(ms).ok()),
      created_at:  decode_millis(self.created_at.unwrap_or_default())?,
    })
  }
}
