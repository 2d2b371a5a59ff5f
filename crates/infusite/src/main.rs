//! `infusite` - CLI for catheter site rotation
//!
//! This binary is the presentation layer: it loads the history, runs the
//! suggestion engine and prints the results.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::Context;
use chrono::{Local, Utc};
use clap::Parser;
use tracing::warn;

use infusite::cli::{
    ClearCommand, Cli, Command, ConfigCommand, ExportCommand, HistoryCommand, LogCommand,
};
use infusite::summary::{entries_newest_first, export_report, format_interval, time_since};
use infusite::{
    average_interval_hours, catalog, init_logging, usage_stats, BlobStore, Config, Error, History,
    MemoryStore, Record, RecordStore, SqliteStore, SuggestionEngine,
};

type Store = RecordStore<Box<dyn BlobStore>>;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    let engine = SuggestionEngine::new().recency_window(config.recency_window());

    match cli.command {
        Command::Suggest(cmd) => handle_suggest(&read_store(&config), &engine, cmd.json),
        Command::Log(cmd) => handle_log(&write_store(&config)?, &engine, cmd),
        Command::History(cmd) => handle_history(&read_store(&config), &cmd),
        Command::Stats(cmd) => handle_stats(&read_store(&config), cmd.json),
        Command::Locations(cmd) => handle_locations(cmd.json),
        Command::Export(cmd) => handle_export(&write_store(&config)?, cmd),
        Command::Clear(cmd) => handle_clear(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Open the store for commands that must not fail on storage errors.
fn read_store(config: &Config) -> Store {
    let backend: Box<dyn BlobStore> = match SqliteStore::open(config.database_path()) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("Storage unavailable, showing empty history: {}", e);
            Box::new(MemoryStore::new())
        }
    };
    RecordStore::new(backend).with_max_records(config.storage.max_records)
}

/// Open the store for commands that write or export.
fn write_store(config: &Config) -> anyhow::Result<Store> {
    let path = config.database_path();
    let backend = SqliteStore::open(&path)
        .with_context(|| format!("could not open history at {}", path.display()))?;
    Ok(RecordStore::new(Box::new(backend) as Box<dyn BlobStore>)
        .with_max_records(config.storage.max_records))
}

fn handle_suggest(store: &Store, engine: &SuggestionEngine, json: bool) -> anyhow::Result<()> {
    let history = store.read_history();
    let suggestion = engine.suggest_next(history.records());
    let last = history.last_record();

    if json {
        let status = serde_json::json!({
            "suggestion": suggestion,
            "last_location_id": history.last_location_id(),
            "last_applied_at": last.map(|r| r.timestamp),
            "records": history.len(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    if let Some(record) = last {
        let name = record
            .location()
            .map_or(record.location_id.as_str(), |loc| loc.display_name);
        println!("Last site:      {name}");
        println!(
            "Changed:        {}",
            time_since(record.timestamp, Utc::now())
        );
    } else {
        println!("No applications recorded yet.");
    }
    println!("Suggested site: {} ({})", suggestion.display_name, suggestion.id);
    Ok(())
}

fn handle_log(store: &Store, engine: &SuggestionEngine, cmd: LogCommand) -> anyhow::Result<()> {
    let location = match cmd.location.as_deref() {
        Some(id) => catalog::find(id).ok_or_else(|| Error::unknown_location(id))?,
        None => engine.suggest_next(store.read_history().records()),
    };

    let mut record = Record::new(location, cmd.at.unwrap_or_else(Utc::now));
    if let Some(note) = &cmd.note {
        record = record.with_notes(note);
    }
    if let Some(hours) = cmd.duration {
        record = record.with_duration_hours(hours)?;
    }

    store
        .append_record(record)
        .context("could not save the record")?;
    println!("Catheter applied at: {}", location.display_name);

    let next = engine.suggest_next(store.read_history().records());
    println!("Next suggested site: {}", next.display_name);
    Ok(())
}

fn handle_history(store: &Store, cmd: &HistoryCommand) -> anyhow::Result<()> {
    let history = store.read_history();
    let limit = cmd.limit.unwrap_or(usize::MAX);
    let entries: Vec<_> = entries_newest_first(&history).take(limit).collect();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No applications recorded yet.");
        return Ok(());
    }

    for entry in &entries {
        let when = entry
            .record
            .timestamp
            .with_timezone(&Local)
            .format("%d/%m/%Y %H:%M");
        let marker = if entry.recent { "  [recent]" } else { "" };
        println!("{when}  {}{marker}", entry.location_name);
        if let Some(notes) = &entry.record.notes {
            println!("    note: {notes}");
        }
        if let Some(hours) = entry.record.duration_hours {
            println!("    worn: {}", format_interval(hours));
        }
    }
    Ok(())
}

fn handle_stats(store: &Store, json: bool) -> anyhow::Result<()> {
    let history = store.read_history();
    let stats = usage_stats(history.records());
    let average = average_interval_hours(history.records());

    if json {
        let report = serde_json::json!({
            "usage": stats,
            "total_records": history.len(),
            "unrecognized": stats.unrecognized(),
            "average_interval_hours": average,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Site usage");
    println!("----------");
    for (location, count) in stats.iter() {
        println!("  {:<18} {count}", location.display_name);
    }
    if stats.unrecognized() > 0 {
        println!("  {:<18} {}", "Unknown", stats.unrecognized());
    }
    println!();
    println!("Total records:    {}", history.len());
    println!("Average interval: {}", format_interval(average));
    Ok(())
}

fn handle_locations(json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog::all())?);
        return Ok(());
    }

    for location in catalog::all() {
        println!(
            "{:<14} {:<18} {:<8} {}",
            location.id, location.display_name, location.zone, location.side
        );
    }
    Ok(())
}

fn handle_export(store: &Store, cmd: ExportCommand) -> anyhow::Result<()> {
    let snapshot = store
        .export_snapshot()
        .context("could not export the history")?;
    let history = History::from_snapshot(&snapshot)?;
    let text = if cmd.raw {
        snapshot
    } else {
        export_report(&history, &snapshot)
    };

    match cmd.output {
        Some(path) => {
            std::fs::write(&path, text)
                .with_context(|| format!("could not write {}", path.display()))?;
            println!("Exported {} records to {}", history.len(), path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn handle_clear(config: &Config, cmd: &ClearCommand) -> anyhow::Result<()> {
    if !cmd.yes {
        println!("This will delete all recorded history and cannot be undone.");
        println!("Use --yes to confirm.");
        return Ok(());
    }

    write_store(config)?
        .clear_history()
        .context("could not clear the history")?;
    println!("History cleared.");
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Max records:        {}", config.storage.max_records);
                print_database_stats(&config.database_path());
                println!();
                println!("[Suggestion]");
                println!(
                    "  Recency window:     {} days",
                    config.suggestion.recency_window_days
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path)).context("configuration is invalid")?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

/// Print blob count and file size for an existing database.
fn print_database_stats(path: &Path) {
    if !path.exists() {
        println!("  Database:           not created yet");
        return;
    }
    match SqliteStore::open(path).and_then(|store| store.stats()) {
        Ok(stats) => {
            println!("  Stored blobs:       {}", stats.blob_count);
            println!("  Database size:      {} bytes", stats.db_size_bytes);
        }
        Err(e) => warn!("Could not read database statistics: {}", e),
    }
}
