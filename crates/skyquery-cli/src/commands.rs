//! Subcommand implementations.

use std::fmt::Write as _;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use skyquery_core::defaults::{INGEST_LOCATIONS, MSG_PROCESS_FAILED};
use skyquery_core::{label_set, LocationCount, NewRecord, Record, RecordRepository, ResponseEnvelope};
use skyquery_db::{Database, FilesystemBackend, LocationBackfill, PayloadStore, PoolConfig};
use skyquery_router::{parse_request, PayloadProcessor};

use crate::config::Config;

/// Read one request from stdin, process it and print exactly one JSON line.
pub async fn process(config: &Config) -> ExitCode {
    let mut input = String::new();
    if let Err(e) = tokio::io::stdin().read_to_string(&mut input).await {
        error!(op = "process", error = %e, "Failed to read request from stdin");
        return respond(ResponseEnvelope::error(e, MSG_PROCESS_FAILED));
    }

    let payload = match parse_request(&input) {
        Ok(payload) => payload,
        Err(e) => {
            error!(op = "process", error = %e, "Failed to parse request");
            return respond(ResponseEnvelope::error(e, MSG_PROCESS_FAILED));
        }
    };

    let (db, _) = match LocationBackfill::default()
        .run_at(&config.database_path, PoolConfig::default(), config.seed_samples)
        .await
    {
        Ok(opened) => opened,
        Err(e) => {
            error!(
                op = "process",
                path = %config.database_path.display(),
                error = %e,
                "Failed to prepare record store"
            );
            return respond(ResponseEnvelope::error(e, MSG_PROCESS_FAILED));
        }
    };

    let payloads = Arc::new(PayloadStore::new(FilesystemBackend::new(&config.storage_dir)));
    let outcome = PayloadProcessor::cloud_with_satellite_fallback(&db, payloads)
        .process(&payload)
        .await;
    db.close().await;

    respond(outcome.response)
}

fn respond(response: ResponseEnvelope) -> ExitCode {
    println!("{}", response.to_json_line());
    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Print store contents, or one location's records.
pub async fn view(config: &Config, location: Option<&str>) -> anyhow::Result<()> {
    let db = open_existing(&config.database_path).await?;
    let report = match location {
        Some(location) => {
            let records = db.records.list_by_location(location).await?;
            render_location(location, &records)
        }
        None => {
            let records = db.records.list_all().await?;
            let stats = db.records.location_stats().await?;
            render_all(&records, &stats)
        }
    };
    db.close().await;

    print!("{report}");
    Ok(())
}

/// Create the schema if absent, seed a fresh store and check the request
/// directory is writable.
pub async fn init(config: &Config) -> anyhow::Result<()> {
    FilesystemBackend::new(&config.storage_dir)
        .validate()
        .await
        .with_context(|| format!("storage directory {}", config.storage_dir.display()))?;

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let db = Database::open(&config.database_path, PoolConfig::default()).await?;
    let seeded = db.initialize(config.seed_samples).await?;
    let total = db.records.overview().await?.total;
    db.close().await;

    println!(
        "Initialized {} ({} records, {} seeded)",
        config.database_path.display(),
        total,
        seeded
    );
    Ok(())
}

/// Label every record that has no location.
pub async fn backfill(config: &Config) -> anyhow::Result<()> {
    let (db, labeled) = LocationBackfill::default()
        .run_at(&config.database_path, PoolConfig::default(), config.seed_samples)
        .await?;
    db.close().await;

    println!("Records labeled: {labeled}");
    Ok(())
}

/// A listing produced by the ingestion job: either a bare array of entries
/// or a page object holding them under `files`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing {
    Entries(Vec<NewRecord>),
    Page { files: Vec<NewRecord> },
}

impl Listing {
    fn into_records(self) -> Vec<NewRecord> {
        match self {
            Listing::Entries(records) | Listing::Page { files: records } => records,
        }
    }
}

fn parse_listing(data: &[u8]) -> anyhow::Result<Vec<NewRecord>> {
    let listing: Listing =
        serde_json::from_slice(data).context("listing must be a JSON array of records")?;
    Ok(listing.into_records())
}

/// Upsert a local listing; entries without a location get a random one.
pub async fn ingest(config: &Config, listing: &Path) -> anyhow::Result<()> {
    let data = tokio::fs::read(listing)
        .await
        .with_context(|| format!("reading {}", listing.display()))?;
    let records = parse_listing(&data)?;

    let db = Database::open_or_init(&config.database_path, PoolConfig::default(), false).await?;
    let summary = db.records.upsert_many(records).await?;
    let labeled = LocationBackfill::default()
        .with_labels(label_set(INGEST_LOCATIONS))
        .run(&db.records)
        .await?;
    db.close().await;

    info!(
        op = "ingest",
        created = summary.created,
        updated = summary.updated,
        labeled,
        "Listing ingested"
    );
    println!("New entries added: {}", summary.created);
    println!("Entries updated: {}", summary.updated);
    Ok(())
}

async fn open_existing(path: &Path) -> anyhow::Result<Database> {
    if !path.exists() {
        bail!(
            "no record store at {} (run `skyquery init` first)",
            path.display()
        );
    }
    let db = Database::open(path, PoolConfig::default().create_if_missing(false)).await?;
    Ok(db)
}

fn display_location(location: Option<&str>) -> &str {
    location.unwrap_or("(none)")
}

fn render_all(records: &[Record], stats: &[LocationCount]) -> String {
    let rule = "-".repeat(100);
    let mut out = String::new();

    let _ = writeln!(out, "Total Entries: {}", records.len());
    let _ = writeln!(out, "{rule}");
    for r in records {
        let _ = writeln!(out, "ID: {}", r.id);
        let _ = writeln!(out, "File ID: {}", r.key);
        let _ = writeln!(out, "Timestamp: {}", r.timestamp);
        let _ = writeln!(out, "Location: {}", display_location(r.location.as_deref()));
        let _ = writeln!(out, "URL: {}", r.url);
        let _ = writeln!(out, "{rule}");
    }

    let _ = writeln!(out, "\nImages per location:");
    for s in stats {
        let _ = writeln!(out, "{}: {}", display_location(s.location.as_deref()), s.count);
    }
    out
}

fn render_location(location: &str, records: &[Record]) -> String {
    let rule = "-".repeat(50);
    let mut out = String::new();

    let _ = writeln!(out, "Entries for location {}: {}", location, records.len());
    for r in records {
        let _ = writeln!(out, "ID: {}", r.id);
        let _ = writeln!(out, "Timestamp: {}", r.timestamp);
        let _ = writeln!(out, "URL: {}", r.url);
        let _ = writeln!(out, "{rule}");
    }
    out
}
