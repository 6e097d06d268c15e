//! SQLite backend for the Gather event cache and audio notes.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. A single [`Database`] is opened at
//! start-up and handed to both [`SqliteEventCache`] and
//! [`SqliteAudioNoteStore`]; the two touch disjoint tables.

mod database;
mod encode;
mod events;
mod locks;
mod notes;
mod schema;

pub mod error;

pub use database::Database;
pub use error::{Error, Result};
pub use events::SqliteEventCache;
pub use notes::SqliteAudioNoteStore;
pub use schema::LATEST_VERSION;
