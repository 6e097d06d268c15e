//! `gather` — drive the local event cache and voice notes from the terminal.
//!
//! # Usage
//!
//! ```text
//! gather sync                               # serve cache, fetch, persist
//! gather events                             # list cached events
//! gather event <id>                         # one event and its note slot
//! gather note store <event-id> <file> --duration-ms 4200
//! gather note show <event-id>
//! gather note delete <event-id>
//! ```
//!
//! Settings come from `gather.toml` (or `--config`) and `GATHER_*`
//! environment variables.

mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use gather_core::store::{AudioNoteStore, EventCache};
use gather_store_sqlite::{Database, SqliteAudioNoteStore, SqliteEventCache};
use gather_sync::{JsonFileSource, Syncer};
use serde::Serialize;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "gather", version, about = "Local event cache and voice notes")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "gather.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Show cached events, then fetch fresh ones and persist them.
  Sync {
    /// Events JSON file to sync from (overrides `events_source`).
    #[arg(long)]
    source: Option<PathBuf>,
  },
  /// List cached events, most recent date first.
  Events,
  /// Show one cached event and its voice-note slot.
  Event { id: String },
  /// Manage the voice note attached to an event.
  #[command(subcommand)]
  Note(NoteCommand),
  /// Print the database schema version.
  Schema,
}

#[derive(Subcommand)]
enum NoteCommand {
  /// Save a finished recording as the event's note, replacing any previous one.
  Store {
    event_id:    String,
    /// The recorder's temporary output file; it is copied, not moved.
    file:        PathBuf,
    #[arg(long)]
    duration_ms: Option<u64>,
  },
  /// Show the event's current note.
  Show { event_id: String },
  /// Delete the event's note and its recording.
  Delete { event_id: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdout carries JSON output.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let db = Database::open(&settings.database_path)
    .await
    .with_context(|| format!("failed to open database at {:?}", settings.database_path))?;

  match cli.command {
    Command::Sync { source } => {
      let source = source.unwrap_or_else(|| settings.events_source.clone());
      sync(db, source).await
    }
    Command::Events => {
      let events = SqliteEventCache::new(db).get_all().await.context("failed to read events")?;
      print_json(&events)
    }
    Command::Event { id } => {
      let Some(event) = SqliteEventCache::new(db.clone()).get(&id).await? else {
        bail!("no cached event with id {id:?}");
      };
      let slot = SqliteAudioNoteStore::new(db, &settings.recordings_dir).slot(&id).await?;
      print_json(&serde_json::json!({ "event": event, "note": slot }))
    }
    Command::Note(cmd) => note(SqliteAudioNoteStore::new(db, &settings.recordings_dir), cmd).await,
    Command::Schema => {
      let version = db.schema_version().await?;
      println!("{version}");
      Ok(())
    }
  }
}

async fn sync(db: Database, source: PathBuf) -> anyhow::Result<()> {
  let syncer = Syncer::new(SqliteEventCache::new(db), JsonFileSource::new(source));
  match syncer.start().await {
    Ok(view) => print_json(&view),
    Err(e) => {
      // Cached events are still valid; show them before reporting.
      print_json(&syncer.current())?;
      Err(e).with_context(|| {
        format!("sync from {} failed", syncer.source().path().display())
      })
    }
  }
}

async fn note(store: SqliteAudioNoteStore, cmd: NoteCommand) -> anyhow::Result<()> {
  match cmd {
    NoteCommand::Store { event_id, file, duration_ms } => {
      let note = store
        .store(&event_id, &file, duration_ms)
        .await
        .with_context(|| format!("voice note for {event_id:?} was NOT saved"))?;
      print_json(&note)
    }
    NoteCommand::Show { event_id } => match store.get_latest(&event_id).await? {
      Some(note) => print_json(&note),
      None => bail!("no voice note for event {event_id:?}"),
    },
    NoteCommand::Delete { event_id } => {
      store.delete(&event_id).await?;
      tracing::info!(event_id = %event_id, "voice note deleted");
      Ok(())
    }
  }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
