//! ccsync - contact-center analytics extract/load

use anyhow::{bail, Context, Result};
use ccsync_common::logging::{init_logging, LogConfig, LogLevel};
use ccsync_pipeline::{
    api::AnalyticsClient,
    config::{ExtractConfig, LoadConfig},
    loader::BulkLoader,
    router::{EntityRouter, StorageEvent},
    stager::Stager,
    storage::{ObjectLocation, S3ObjectStore},
    warehouse::BigQueryClient,
    ExtractRun, LoadRun, PipelineError,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ccsync")]
#[command(author, version, about = "Contact-center analytics extract/load")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Page conversations, queues and users into the staging bucket
    Extract,

    /// Load staged objects into their warehouse tables
    Load {
        /// Storage event JSON file ("-" for stdin)
        #[arg(long, conflicts_with = "object")]
        event: Option<PathBuf>,

        /// Staged object as bucket/name (repeatable)
        #[arg(long, value_parser = parse_location)]
        object: Vec<ObjectLocation>,
    },
}

fn parse_location(value: &str) -> std::result::Result<ObjectLocation, String> {
    ObjectLocation::parse(value).ok_or_else(|| format!("expected bucket/name, got {:?}", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("ccsync")
        .build()
        .merge_lookup(|key| std::env::var(key).ok())?;

    let _guard = init_logging(&log_config)?;

    match cli.command {
        Command::Extract => extract().await,
        Command::Load { event, object } => load(event, object).await,
    }
}

async fn extract() -> Result<()> {
    let config = ExtractConfig::from_env().map_err(PipelineError::from)?;

    let api = AnalyticsClient::authorize(&config.api)
        .await
        .map_err(|e| PipelineError::Auth(e.to_string()))?;
    let warehouse = BigQueryClient::new(&config.warehouse)?;
    let store = S3ObjectStore::new(&config.storage).await;
    let stager = Stager::new(Arc::new(store), &config.bucket);

    let run = ExtractRun::from_config(Arc::new(api), Arc::new(warehouse), stager, &config);
    let report = run.run(chrono::Utc::now()).await;
    report.log_summary();

    if !report.is_success() {
        bail!("extraction run finished with aborted entities");
    }
    Ok(())
}

async fn load(event: Option<PathBuf>, objects: Vec<ObjectLocation>) -> Result<()> {
    let config = LoadConfig::from_env().map_err(PipelineError::from)?;

    let locations = if objects.is_empty() {
        let raw = read_event(event.as_deref())?;
        let event = StorageEvent::from_json(&raw).context("Invalid storage event payload")?;
        vec![event.location()]
    } else {
        objects
    };

    let warehouse = BigQueryClient::new(&config.warehouse)?;
    let loader = BulkLoader::new(Arc::new(warehouse)).with_poll_interval(config.poll_interval);
    let run = LoadRun::new(EntityRouter::new(loader, config.tables.clone()));

    let report = run.run(&locations).await;
    report.log_summary();

    if !report.is_success() {
        bail!("{} of {} objects failed to load", report.failed(), locations.len());
    }
    info!("All objects handled");
    Ok(())
}

fn read_event(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {}", path.display())),
        _ => std::io::read_to_string(std::io::stdin()).context("Failed to read event from stdin"),
    }
}
