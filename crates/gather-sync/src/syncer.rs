//! [`Syncer`] — cache-first event loading with background refresh.

use chrono::{DateTime, Utc};
use gather_core::{event::Event, source::EventSource, store::EventCache};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::{Error, Result};

// ─── Published view ──────────────────────────────────────────────────────────

/// Where the current sync cycle stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
  /// No sync has run yet.
  #[default]
  Idle,
  /// Start-up sync in progress; cached events may already be shown.
  Loading,
  /// Manual refresh in progress.
  Refreshing,
  Synced,
  /// The last cycle failed; the events shown are whatever was cached.
  Failed { reason: String },
}

impl SyncStatus {
  pub fn is_busy(&self) -> bool { matches!(self, Self::Loading | Self::Refreshing) }
}

/// What the UI renders: the event list plus sync state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventsView {
  pub events:         Vec<Event>,
  pub status:         SyncStatus,
  /// Completion time of the last successful sync; kept across failures.
  pub last_synced_at: Option<DateTime<Utc>>,
}

// ─── Syncer ──────────────────────────────────────────────────────────────────

/// Serves cached events first, then fetches, persists and republishes.
///
/// Sync cycles never overlap: a refresh requested while another cycle is
/// running waits for it to finish, then runs its own.
pub struct Syncer<C, S> {
  cache:  C,
  source: S,
  view:   watch::Sender<EventsView>,
  cycle:  Mutex<()>,
}

impl<C, S> Syncer<C, S>
where
  C: EventCache,
  S: EventSource,
{
  pub fn new(cache: C, source: S) -> Self {
    let (view, _) = watch::channel(EventsView::default());
    Self { cache, source, view, cycle: Mutex::new(()) }
  }

  /// Observe every view the syncer publishes.
  pub fn subscribe(&self) -> watch::Receiver<EventsView> { self.view.subscribe() }

  pub fn source(&self) -> &S { &self.source }

  /// A snapshot of the latest published view.
  pub fn current(&self) -> EventsView { self.view.borrow().clone() }

  /// The start-up cycle.
  pub async fn start(&self) -> Result<EventsView> { self.run(SyncStatus::Loading).await }

  /// A user-initiated refresh.
  pub async fn refresh(&self) -> Result<EventsView> { self.run(SyncStatus::Refreshing).await }

  async fn run(&self, phase: SyncStatus) -> Result<EventsView> {
    let _cycle = self.cycle.lock().await;
    self.view.send_modify(|view| view.status = phase);

    let outcome = match self.serve_cached().await {
      Ok(()) => self.pull().await,
      Err(e) => Err(e),
    };

    match outcome {
      Ok(events) => {
        self.view.send_modify(|view| {
          view.events = events;
          view.status = SyncStatus::Synced;
          view.last_synced_at = Some(Utc::now());
        });
        Ok(self.current())
      }
      Err(e) => {
        tracing::warn!(error = %e, "event sync failed; keeping cached events");
        let reason = e.to_string();
        self.view.send_modify(|view| view.status = SyncStatus::Failed { reason });
        Err(e)
      }
    }
  }

  /// Publish whatever is cached so the UI has something to show while the
  /// fetch is in flight. An empty cache leaves the current list alone.
  async fn serve_cached(&self) -> Result<()> {
    let cached = self.cache.get_all().await.map_err(Error::from_cache)?;
    if !cached.is_empty() {
      tracing::debug!(count = cached.len(), "serving cached events");
      self.view.send_modify(|view| view.events = cached);
    }
    Ok(())
  }

  /// Fetch, persist, and return the merged cache contents.
  async fn pull(&self) -> Result<Vec<Event>> {
    let fresh = self.source.fetch_events().await.map_err(Error::from_source)?;
    let fetched = fresh.len();
    self.cache.upsert_all(fresh).await.map_err(Error::from_cache)?;

    let merged = self.cache.get_all().await.map_err(Error::from_cache)?;
    tracing::info!(fetched, cached = merged.len(), "events synced");
    Ok(merged)
  }
}
