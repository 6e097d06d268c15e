//! [`SqliteEventCache`] — the SQLite implementation of [`EventCache`].

use gather_core::{event::Event, store::EventCache};
use rusqlite::OptionalExtension as _;

use crate::{
  encode::{event_from_row, EVENT_COLUMNS},
  Database, Error, Result,
};

const UPSERT_EVENT: &str = "INSERT OR REPLACE INTO events (
     id, title, date, startTime, endTime, place, host, address,
     lat, lon, about, bring, culture, location, organizer
   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)";

/// Event cache backed by the shared [`Database`].
#[derive(Clone)]
pub struct SqliteEventCache {
  db: Database,
}

impl SqliteEventCache {
  pub fn new(db: Database) -> Self { Self { db } }
}

impl EventCache for SqliteEventCache {
  type Error = Error;

  async fn upsert_all(&self, events: Vec<Event>) -> Result<()> {
    if events.is_empty() {
      return Ok(());
    }
    // Validate up front so a bad record rejects the batch before any write.
    for event in &events {
      event.validate()?;
    }

    let count = events.len();
    self
      .db
      .conn()
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare_cached(UPSERT_EVENT)?;
          for e in &events {
            stmt.execute(rusqlite::params![
              e.id,
              e.title,
              e.date,
              e.start_time,
              e.end_time,
              e.place,
              e.host,
              e.address,
              e.lat,
              e.lon,
              e.about,
              e.bring,
              e.culture,
              e.location,
              e.organizer,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(count, "upserted events");
    Ok(())
  }

  async fn get_all(&self) -> Result<Vec<Event>> {
    let events = self
      .db
      .conn()
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events ORDER BY date DESC, id ASC"
        ))?;
        let rows = stmt
          .query_map([], event_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(events)
  }

  async fn get(&self, id: &str) -> Result<Option<Event>> {
    let id = id.to_owned();
    let event = self
      .db
      .conn()
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
              rusqlite::params![id],
              event_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(event)
  }
}
