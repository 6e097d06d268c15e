//! Syncer tests against an in-memory SQLite cache.

use std::{
  io,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use gather_core::{event::Event, source::EventSource, store::EventCache};
use gather_store_sqlite::{Database, SqliteEventCache};
use tokio::sync::{oneshot, Mutex};

use crate::{Error, EventsView, JsonFileSource, SourceError, SyncStatus, Syncer};

async fn cache() -> SqliteEventCache {
  SqliteEventCache::new(Database::open_in_memory().await.expect("in-memory database"))
}

fn event(id: &str, date: &str) -> Event { Event::new(id, format!("Event {id}"), date) }

fn ids(view: &EventsView) -> Vec<&str> { view.events.iter().map(|e| e.id.as_str()).collect() }

// ─── Test sources ────────────────────────────────────────────────────────────

struct StaticSource(Vec<Event>);

impl EventSource for StaticSource {
  type Error = io::Error;

  async fn fetch_events(&self) -> Result<Vec<Event>, io::Error> { Ok(self.0.clone()) }
}

struct OfflineSource;

impl EventSource for OfflineSource {
  type Error = io::Error;

  async fn fetch_events(&self) -> Result<Vec<Event>, io::Error> {
    Err(io::Error::new(io::ErrorKind::NotConnected, "offline"))
  }
}

/// Fails while `online` is false.
struct ToggleSource {
  online: AtomicBool,
  events: Vec<Event>,
}

impl EventSource for ToggleSource {
  type Error = io::Error;

  async fn fetch_events(&self) -> Result<Vec<Event>, io::Error> {
    if self.online.load(Ordering::SeqCst) {
      Ok(self.events.clone())
    } else {
      Err(io::Error::new(io::ErrorKind::NotConnected, "offline"))
    }
  }
}

/// Blocks the fetch until the test opens the gate.
struct GatedSource {
  gate:   Mutex<Option<oneshot::Receiver<()>>>,
  events: Vec<Event>,
}

impl EventSource for GatedSource {
  type Error = io::Error;

  async fn fetch_events(&self) -> Result<Vec<Event>, io::Error> {
    if let Some(gate) = self.gate.lock().await.take() {
      let _ = gate.await;
    }
    Ok(self.events.clone())
  }
}

// ─── Cycles ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn start_serves_cache_before_fetch_completes() {
  let c = cache().await;
  c.upsert_all(vec![event("cached", "2024-01-01")]).await.unwrap();

  let (open, gate) = oneshot::channel();
  let syncer = Arc::new(Syncer::new(c, GatedSource {
    gate:   Mutex::new(Some(gate)),
    events: vec![event("fresh", "2024-02-01")],
  }));
  let mut rx = syncer.subscribe();

  let task = tokio::spawn({
    let syncer = Arc::clone(&syncer);
    async move { syncer.start().await }
  });

  let early = rx
    .wait_for(|v| v.status == SyncStatus::Loading && !v.events.is_empty())
    .await
    .unwrap()
    .clone();
  assert_eq!(ids(&early), ["cached"]);
  assert!(early.status.is_busy());

  open.send(()).unwrap();
  let view = task.await.unwrap().unwrap();
  assert_eq!(view.status, SyncStatus::Synced);
  assert_eq!(ids(&view), ["fresh", "cached"]);
}

#[tokio::test]
async fn start_with_empty_cache_publishes_fresh_events() {
  let syncer = Syncer::new(cache().await, StaticSource(vec![
    event("a", "2024-01-01"),
    event("b", "2024-03-01"),
  ]));
  assert_eq!(syncer.current().status, SyncStatus::Idle);

  let view = syncer.start().await.unwrap();
  assert_eq!(ids(&view), ["b", "a"]);
  assert!(view.last_synced_at.is_some());
  assert_eq!(ids(&syncer.current()), ["b", "a"]);
}

#[tokio::test]
async fn fetch_failure_keeps_cached_events() {
  let c = cache().await;
  c.upsert_all(vec![event("cached", "2024-01-01")]).await.unwrap();
  let syncer = Syncer::new(c, OfflineSource);

  let err = syncer.start().await.unwrap_err();
  assert!(matches!(err, Error::Source(_)));

  let view = syncer.current();
  assert_eq!(ids(&view), ["cached"]);
  assert!(matches!(view.status, SyncStatus::Failed { ref reason } if reason.contains("offline")));
  assert!(view.last_synced_at.is_none());
}

#[tokio::test]
async fn invalid_batch_leaves_cache_untouched() {
  let c = cache().await;
  c.upsert_all(vec![event("cached", "2024-01-01")]).await.unwrap();
  let syncer = Syncer::new(c.clone(), StaticSource(vec![
    event("fresh", "2024-02-01"),
    Event::new("", "broken", "2024-02-02"),
  ]));

  let err = syncer.refresh().await.unwrap_err();
  assert!(matches!(err, Error::Cache(_)));

  let stored: Vec<_> = c.get_all().await.unwrap().into_iter().map(|e| e.id).collect();
  assert_eq!(stored, ["cached"]);
  assert_eq!(ids(&syncer.current()), ["cached"]);
}

#[tokio::test]
async fn refresh_merges_without_eviction() {
  let c = cache().await;
  c.upsert_all(vec![event("old", "2023-12-01")]).await.unwrap();
  let syncer = Syncer::new(c, StaticSource(vec![event("new", "2024-01-01")]));

  let view = syncer.refresh().await.unwrap();
  assert_eq!(ids(&view), ["new", "old"]);
  assert_eq!(view.status, SyncStatus::Synced);
}

#[tokio::test]
async fn last_sync_time_survives_a_failed_refresh() {
  let syncer = Syncer::new(cache().await, ToggleSource {
    online: AtomicBool::new(true),
    events: vec![event("a", "2024-01-01")],
  });
  let synced = syncer.start().await.unwrap();
  let synced_at = synced.last_synced_at.expect("sync time recorded");

  syncer.source().online.store(false, Ordering::SeqCst);
  assert!(syncer.refresh().await.is_err());

  let view = syncer.current();
  assert_eq!(view.last_synced_at, Some(synced_at));
  assert_eq!(ids(&view), ["a"]);
}

// ─── JSON source ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn json_file_source_reads_events() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("events.json");
  std::fs::write(
    &path,
    r#"[{"id": "ev1", "title": "Dance", "date": "2024-01-01", "startTime": "2024-01-01T18:00"}]"#,
  )
  .unwrap();

  let events = JsonFileSource::new(&path).fetch_events().await.unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].start_time, "2024-01-01T18:00");
}

#[tokio::test]
async fn json_file_source_reports_missing_file() {
  let dir = tempfile::tempdir().unwrap();
  let err = JsonFileSource::new(dir.path().join("nope.json"))
    .fetch_events()
    .await
    .unwrap_err();
  assert!(matches!(err, SourceError::Read { .. }));
}
