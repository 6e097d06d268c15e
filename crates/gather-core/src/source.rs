//! The remote event feed consumed by the sync orchestrator.

use std::future::Future;

use crate::event::Event;

/// Where fresh events come from. Currently backed by a bundled JSON file;
/// a network client would implement the same trait.
pub trait EventSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the full current list of events.
  fn fetch_events(&self) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;
}
