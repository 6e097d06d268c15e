//! [`SqliteAudioNoteStore`] — the SQLite implementation of [`AudioNoteStore`].
//!
//! A store call touches two resources that cannot share a transaction: the
//! recordings directory and the `audio_notes` table. Steps are ordered so
//! that a failure at any point leaves the event's previous note intact:
//!
//! 1. copy the recording into the recordings directory under a fresh name;
//! 2. in one transaction, delete the event's old rows and insert the new one;
//! 3. delete the old backing files, best-effort.
//!
//! A failure in step 1 or 2 removes the fresh copy and leaves the database as
//! it was. A failure in step 3 only leaks a file.

use std::{
  io::{self, ErrorKind},
  path::{Component, Path, PathBuf},
  sync::Arc,
};

use chrono::Utc;
use gather_core::{note::AudioNote, store::AudioNoteStore};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  encode::{decode_millis, encode_duration, encode_millis, RawNote, NOTE_COLUMNS},
  locks::EventLocks,
  Database, Error, Result,
};

/// Extension used when the recording has none.
const DEFAULT_EXTENSION: &str = "m4a";

/// Longest event-id prefix kept in a recording's file name.
const MAX_STEM_LEN: usize = 64;

/// Audio notes backed by the shared [`Database`] and a recordings directory
/// owned exclusively by this store.
///
/// Mutations of the same event serialize on an internal per-event lock.
/// Cloning is cheap and clones share those locks.
#[derive(Clone)]
pub struct SqliteAudioNoteStore {
  db:             Database,
  recordings_dir: PathBuf,
  locks:          Arc<EventLocks>,
}

impl SqliteAudioNoteStore {
  /// The directory is created on first use, not here. A relative path is
  /// resolved against the current working directory now, so stored file
  /// paths stay valid for later runs started elsewhere.
  pub fn new(db: Database, recordings_dir: impl Into<PathBuf>) -> Self {
    let recordings_dir = recordings_dir.into();
    let recordings_dir = match normalize(&recordings_dir) {
      Ok(resolved) => resolved,
      Err(e) => {
        tracing::warn!(
          path = %recordings_dir.display(),
          error = %e,
          "could not resolve recordings directory; using it as given"
        );
        recordings_dir
      }
    };
    Self { db, recordings_dir, locks: Arc::new(EventLocks::default()) }
  }

  pub fn recordings_dir(&self) -> &Path { &self.recordings_dir }

  async fn ensure_recordings_dir(&self) -> Result<()> {
    tokio::fs::create_dir_all(&self.recordings_dir)
      .await
      .map_err(|e| Error::io(&self.recordings_dir, e))
  }

  /// A destination path derived from the event id. The random suffix keeps
  /// the new copy from overwriting the previous note's file before the row
  /// swap has committed.
  fn destination_for(&self, event_id: &str, source: &Path) -> PathBuf {
    let stem: String = event_id
      .chars()
      .take(MAX_STEM_LEN)
      .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
      .collect();
    let extension = source
      .extension()
      .and_then(|ext| ext.to_str())
      .filter(|ext| !ext.is_empty())
      .unwrap_or(DEFAULT_EXTENSION);
    self
      .recordings_dir
      .join(format!("{stem}-{}.{extension}", Uuid::new_v4().simple()))
  }

  /// Delete a backing file this store created. Missing files are fine; other
  /// errors are logged and swallowed. Paths outside the recordings directory
  /// are never touched.
  async fn remove_owned_file(&self, path: &Path) {
    let resolved = match normalize(path) {
      Ok(resolved) if resolved.starts_with(&self.recordings_dir) => resolved,
      _ => {
        tracing::warn!(
          path = %path.display(),
          "not deleting audio file outside the recordings directory"
        );
        return;
      }
    };
    match tokio::fs::remove_file(&resolved).await {
      Ok(()) => tracing::debug!(path = %path.display(), "deleted audio file"),
      Err(e) if e.kind() == ErrorKind::NotFound => {}
      Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to delete audio file"),
    }
  }

  /// Remove a partially or fully written copy after a failed store.
  async fn discard_copy(path: &Path) {
    match tokio::fs::remove_file(path).await {
      Ok(()) => {}
      Err(e) if e.kind() == ErrorKind::NotFound => {}
      Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to discard audio copy"),
    }
  }

  /// Swap the event's rows for a single new one. Returns the new row id and
  /// the file paths of the rows it replaced.
  async fn replace_rows(
    &self,
    event_id: String,
    file_uri: String,
    duration_ms: Option<i64>,
    created_at: i64,
  ) -> Result<(i64, Vec<PathBuf>)> {
    let swapped = self
      .db
      .conn()
      .call(move |conn| {
        let tx = conn.transaction()?;
        let previous = {
          let mut stmt = tx.prepare("SELECT file_uri FROM audio_notes WHERE event_id = ?1")?;
          stmt
            .query_map(rusqlite::params![event_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.execute("DELETE FROM audio_notes WHERE event_id = ?1", rusqlite::params![event_id])?;
        tx.execute(
          "INSERT INTO audio_notes (event_id, file_uri, duration_ms, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![event_id, file_uri, duration_ms, created_at],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok((id, previous))
      })
      .await?;

    let (id, previous) = swapped;
    Ok((id, previous.into_iter().map(PathBuf::from).collect()))
  }

  async fn file_uris(&self, event_id: &str) -> Result<Vec<PathBuf>> {
    let event_id = event_id.to_owned();
    let uris = self
      .db
      .conn()
      .call(move |conn| {
        let mut stmt = conn.prepare("SELECT file_uri FROM audio_notes WHERE event_id = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![event_id], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(uris.into_iter().map(PathBuf::from).collect())
  }
}

/// The absolute form of `path` with `.` and `..` resolved lexically.
/// Symlinks are not followed.
fn normalize(path: &Path) -> io::Result<PathBuf> {
  let mut resolved = PathBuf::new();
  for component in std::path::absolute(path)?.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        resolved.pop();
      }
      other => resolved.push(other),
    }
  }
  Ok(resolved)
}

fn ensure_event_id(event_id: &str) -> Result<()> {
  if event_id.trim().is_empty() {
    return Err(gather_core::Error::EmptyNoteEventId.into());
  }
  Ok(())
}

// ─── AudioNoteStore impl ─────────────────────────────────────────────────────

impl AudioNoteStore for SqliteAudioNoteStore {
  type Error = Error;

  async fn store(
    &self,
    event_id: &str,
    source: &Path,
    duration_ms: Option<u64>,
  ) -> Result<AudioNote> {
    ensure_event_id(event_id)?;
    let _guard = self.locks.lock(event_id).await;

    self.ensure_recordings_dir().await?;

    match tokio::fs::try_exists(source).await {
      Ok(true) => {}
      Ok(false) => return Err(Error::SourceMissing(source.to_path_buf())),
      Err(e) => return Err(Error::io(source, e)),
    }

    let dest = self.destination_for(event_id, source);
    if let Err(e) = tokio::fs::copy(source, &dest).await {
      Self::discard_copy(&dest).await;
      return Err(Error::io(&dest, e));
    }

    let created_ms = encode_millis(Utc::now());
    let swapped = self
      .replace_rows(
        event_id.to_owned(),
        dest.to_string_lossy().into_owned(),
        encode_duration(duration_ms),
        created_ms,
      )
      .await;

    let (id, previous) = match swapped {
      Ok(swapped) => swapped,
      Err(e) => {
        Self::discard_copy(&dest).await;
        return Err(e);
      }
    };

    for old in previous.iter().filter(|old| **old != dest) {
      self.remove_owned_file(old).await;
    }

    tracing::info!(
      event_id,
      path = %dest.display(),
      replaced = previous.len(),
      "stored audio note"
    );

    Ok(AudioNote {
      id,
      event_id: event_id.to_owned(),
      file_path: dest,
      duration_ms,
      created_at: decode_millis(created_ms)?,
    })
  }

  async fn get_latest(&self, event_id: &str) -> Result<Option<AudioNote>> {
    let event_id = event_id.to_owned();
    let raw = self
      .db
      .conn()
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {NOTE_COLUMNS} FROM audio_notes WHERE event_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT 1"
              ),
              rusqlite::params![event_id],
              RawNote::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawNote::into_note).transpose()
  }

  async fn delete(&self, event_id: &str) -> Result<()> {
    let _guard = self.locks.lock(event_id).await;

    for path in self.file_uris(event_id).await? {
      self.remove_owned_file(&path).await;
    }

    let owned_id = event_id.to_owned();
    let removed = self
      .db
      .conn()
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM audio_notes WHERE event_id = ?1", rusqlite::params![owned_id])?)
      })
      .await?;

    if removed > 0 {
      tracing::info!(event_id, "deleted audio note");
    }
    Ok(())
  }
}
