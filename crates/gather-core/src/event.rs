//! The cached [`Event`] record.
//!
//! Events arrive from the remote source as camelCase JSON in which every field
//! other than `id` may be missing. Missing fields take their storage default
//! (empty string or `0.0`) so the cache never has to store NULL.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A scheduled community gathering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
  /// Stable upstream identifier; the cache's primary key.
  pub id:         String,
  pub title:      String,
  /// ISO calendar date, `YYYY-MM-DD`. Sorted as a plain string.
  pub date:       String,
  /// ISO datetime, e.g. `2024-03-01T18:00`.
  pub start_time: String,
  pub end_time:   String,
  pub place:      String,
  pub address:    String,
  pub host:       String,
  pub about:      String,
  /// What attendees should bring.
  pub bring:      String,
  /// Cultural context for the gathering.
  pub culture:    String,
  /// Later payloads carry this alias for `place`.
  pub location:   String,
  /// Later payloads carry this alias for `host`.
  pub organizer:  String,
  pub lat:        f64,
  pub lon:        f64,
}

impl Event {
  /// Convenience constructor with every optional field at its default.
  pub fn new(id: impl Into<String>, title: impl Into<String>, date: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      title: title.into(),
      date: date.into(),
      ..Self::default()
    }
  }

  /// Reject records the cache cannot key.
  pub fn validate(&self) -> Result<()> {
    if self.id.trim().is_empty() {
      return Err(Error::EmptyEventId);
    }
    Ok(())
  }

  /// The venue to display: `location` when present, otherwise `place`.
  pub fn venue(&self) -> &str {
    if self.location.is_empty() { &self.place } else { &self.location }
  }

  /// The organiser to display: `organizer` when present, otherwise `host`.
  pub fn organizer_name(&self) -> &str {
    if self.organizer.is_empty() { &self.host } else { &self.organizer }
  }

  /// Parse [`Event::date`] as a calendar date, if it is well-formed.
  pub fn calendar_date(&self) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
  }

  /// Whether the event has usable coordinates. `(0, 0)` is the storage
  /// default for "unknown", not a real venue.
  pub fn has_coordinates(&self) -> bool { self.lat != 0.0 || self.lon != 0.0 }
}

/// Parse a JSON array of events as served by the remote source.
pub fn parse_events(json: &str) -> Result<Vec<Event>> {
  let events: Vec<Event> = serde_json::from_str(json)?;
  for event in &events {
    event.validate()?;
  }
  Ok(events)
}
