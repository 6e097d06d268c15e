//! Sync orchestration for the Gather event cache.
//!
//! [`Syncer`] serves cached events immediately, then pulls fresh events from
//! an [`EventSource`](gather_core::source::EventSource), persists them through
//! an [`EventCache`](gather_core::store::EventCache) and republishes the
//! merged view to every subscriber.

mod source;
mod syncer;

pub mod error;

pub use error::{Error, Result, SourceError};
pub use source::JsonFileSource;
pub use syncer::{EventsView, SyncStatus, Syncer};

#[cfg(test)]
mod tests;
