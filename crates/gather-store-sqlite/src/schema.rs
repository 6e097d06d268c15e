//! SQL schema and the forward-only migration chain.
//!
//! The schema version lives in `PRAGMA user_version`. Each migration moves the
//! database from `version - 1` to `version` inside its own transaction, so a
//! failed step leaves the database at the previous version.
//!
//! Databases written before versioning existed report version 0. Migration 1
//! reconciles them: an `events` table in a legacy layout (a combined `time`
//! column, the `start`/`end` layout, or any layout missing a column of
//! [`EVENT_BASE_COLUMNS`]) is **dropped**. Those cached events are lost and
//! come back with the next sync; if that sync fails the event list stays
//! empty until one succeeds.
//! `audio_notes` has had a single layout and is never dropped.

use rusqlite::{Connection, Transaction};

/// Connection-level settings; must run outside any transaction.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
";

const CREATE_V1: &str = "
CREATE TABLE IF NOT EXISTS events (
    id        TEXT PRIMARY KEY NOT NULL,
    title     TEXT NOT NULL DEFAULT '',
    date      TEXT NOT NULL DEFAULT '',   -- YYYY-MM-DD; sorted as text
    startTime TEXT NOT NULL DEFAULT '',
    endTime   TEXT NOT NULL DEFAULT '',
    place     TEXT NOT NULL DEFAULT '',
    host      TEXT NOT NULL DEFAULT '',
    address   TEXT NOT NULL DEFAULT '',
    lat       REAL NOT NULL DEFAULT 0,
    lon       REAL NOT NULL DEFAULT 0,
    about     TEXT NOT NULL DEFAULT '',
    bring     TEXT NOT NULL DEFAULT '',
    culture   TEXT NOT NULL DEFAULT ''
);

-- At most one current row per event_id, enforced by the store.
CREATE TABLE IF NOT EXISTS audio_notes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id    TEXT NOT NULL,
    file_uri    TEXT NOT NULL,
    duration_ms INTEGER,
    created_at  INTEGER NOT NULL          -- epoch milliseconds
);
";

/// Every `events` column created by v1. Later columns are added by migrations
/// and may be missing from a pre-versioned table.
const EVENT_BASE_COLUMNS: &[&str] = &[
  "id", "title", "date", "startTime", "endTime", "place", "host", "address", "lat", "lon",
  "about", "bring", "culture",
];

const CREATE_V3_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS audio_notes_event_idx ON audio_notes(event_id, created_at);
CREATE INDEX IF NOT EXISTS events_date_idx       ON events(date);
";

// ─── Migration chain ─────────────────────────────────────────────────────────

pub struct Migration {
  pub version: i64,
  pub name:    &'static str,
  apply:       fn(&Transaction<'_>) -> rusqlite::Result<()>,
}

pub const MIGRATIONS: &[Migration] = &[
  Migration { version: 1, name: "baseline", apply: baseline },
  Migration { version: 2, name: "event_aliases", apply: event_aliases },
  Migration { version: 3, name: "indexes", apply: indexes },
];

/// The version a fully migrated database reports.
pub const LATEST_VERSION: i64 = 3;

/// v1: drop a legacy `events` table, then create both tables.
fn baseline(tx: &Transaction<'_>) -> rusqlite::Result<()> {
  let columns = table_columns(tx, "events")?;
  if !columns.is_empty() && is_legacy_events_layout(&columns) {
    let discarded: i64 =
      tx.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
    tracing::warn!(
      discarded,
      ?columns,
      "legacy events layout; dropping cached events until next sync"
    );
    tx.execute_batch("DROP TABLE events;")?;
  }
  tx.execute_batch(CREATE_V1)
}

/// v2: `location` and `organizer` alias columns.
fn event_aliases(tx: &Transaction<'_>) -> rusqlite::Result<()> {
  let columns = table_columns(tx, "events")?;
  for column in ["location", "organizer"] {
    if !columns.iter().any(|c| c == column) {
      tx.execute_batch(&format!(
        "ALTER TABLE events ADD COLUMN {column} TEXT NOT NULL DEFAULT '';"
      ))?;
    }
  }
  Ok(())
}

fn indexes(tx: &Transaction<'_>) -> rusqlite::Result<()> {
  tx.execute_batch(CREATE_V3_INDEXES)
}

/// A pre-versioned events table is kept only if it already has every v1
/// column and no combined `time` column.
fn is_legacy_events_layout(columns: &[String]) -> bool {
  let has = |name: &str| columns.iter().any(|c| c == name);
  has("time") || !EVENT_BASE_COLUMNS.iter().all(|c| has(*c))
}

// ─── Runner ──────────────────────────────────────────────────────────────────

pub fn user_version(conn: &Connection) -> rusqlite::Result<i64> {
  conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Column names of `table`, or an empty list if it does not exist.
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
  let columns = stmt
    .query_map([], |row| row.get::<_, String>(1))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(columns)
}

/// Apply every migration newer than `from`, in order. Returns the versions
/// applied.
///
/// The caller must already have checked that `from <= LATEST_VERSION`.
pub fn apply_pending(conn: &mut Connection, from: i64) -> rusqlite::Result<Vec<i64>> {
  let mut applied = Vec::new();
  for migration in MIGRATIONS.iter().filter(|m| m.version > from) {
    let tx = conn.transaction()?;
    (migration.apply)(&tx)?;
    tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    tx.commit()?;
    tracing::info!(version = migration.version, name = migration.name, "applied migration");
    applied.push(migration.version);
  }
  Ok(applied)
}
