//! [`Database`] — the shared SQLite handle and schema manager.

use std::path::Path;

use crate::{
  schema::{self, LATEST_VERSION, PRAGMAS},
  Error, Result,
};

/// The single SQLite database shared by the event cache and the audio store.
///
/// Open it once at start-up and pass clones to each store. Cloning is cheap:
/// the inner connection is reference-counted. The handle lives as long as its
/// last clone; there is no explicit close.
#[derive(Clone)]
pub struct Database {
  conn: tokio_rusqlite::Connection,
}

impl Database {
  /// Open (or create) the database at `path` and bring its schema up to date.
  ///
  /// Fails if the file cannot be opened, if a migration fails, or if the file
  /// was written by a newer schema. There is no degraded mode.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    tracing::debug!(path = %path.display(), "opening database");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory database, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let db = Self { conn };
    db.migrate().await?;
    Ok(db)
  }

  async fn migrate(&self) -> Result<()> {
    let found = self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(schema::user_version(conn)?)
      })
      .await?;

    if found > LATEST_VERSION {
      return Err(Error::SchemaTooNew { found, supported: LATEST_VERSION });
    }

    let applied = self
      .conn
      .call(move |conn| Ok(schema::apply_pending(conn, found)?))
      .await?;

    if !applied.is_empty() {
      tracing::info!(from = found, to = LATEST_VERSION, "database schema migrated");
    }
    Ok(())
  }

  /// The schema version recorded in the database file.
  pub async fn schema_version(&self) -> Result<i64> {
    let version = self
      .conn
      .call(|conn| Ok(schema::user_version(conn)?))
      .await?;
    Ok(version)
  }

  pub(crate) fn conn(&self) -> &tokio_rusqlite::Connection { &self.conn }
}
