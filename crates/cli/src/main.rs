//! herbcachectl: operate a running herbcache proxy and its partition store.
//!
//! `status`, `skip-waiting` and `preload` talk to the server's control
//! endpoints. `partitions` opens the SQLite store directly.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use herbcache_core::{AppConfig, CleanupReport, ControlMessage, GenerationManager, PartitionStore};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "herbcachectl", version, about = "Control a herbcache offline proxy")]
struct Cli {
    /// Base URL of the running proxy.
    #[arg(long, env = "HERBCACHE_ENDPOINT", default_value = "http://127.0.0.1:8080", global = true)]
    endpoint: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show lifecycle state and partition sizes.
    Status,
    /// Tell a waiting generation to activate now.
    SkipWaiting,
    /// Warm the models partition.
    Preload {
        /// Model paths, e.g. /models/tulsi.glb
        paths: Vec<String>,
    },
    /// Inspect or clean the partition store offline.
    Partitions {
        #[command(subcommand)]
        action: PartitionsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum PartitionsCommand {
    /// List partitions, marking those outside the current generation.
    List {
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Delete partitions outside the current generation.
    Clean {
        #[arg(long)]
        db: Option<PathBuf>,
        /// Only print what would be deleted.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Serialize)]
struct PreloadBody<'a> {
    paths: &'a [String],
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let endpoint = cli.endpoint.trim_end_matches('/').to_string();

    match cli.command {
        Command::Status => {
            let status: serde_json::Value = reqwest::get(format!("{endpoint}/__herbcache/status"))
                .await
                .context("proxy unreachable")?
                .error_for_status()?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::SkipWaiting => {
            let response = reqwest::Client::new()
                .post(format!("{endpoint}/__herbcache/message"))
                .json(&ControlMessage::SkipWaiting)
                .send()
                .await
                .context("proxy unreachable")?;
            if !response.status().is_success() {
                bail!("proxy rejected SKIP_WAITING: {}", response.status());
            }
            println!("SKIP_WAITING sent");
        }
        Command::Preload { paths } => {
            let report: serde_json::Value = reqwest::Client::new()
                .post(format!("{endpoint}/__herbcache/preload"))
                .json(&PreloadBody { paths: &paths })
                .send()
                .await
                .context("proxy unreachable")?
                .error_for_status()?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Partitions { action } => {
            let config = AppConfig::load()?;
            match action {
                PartitionsCommand::List { db } => {
                    let store = open_store(db, &config).await?;
                    for line in list(&store, &config).await? {
                        println!("{line}");
                    }
                }
                PartitionsCommand::Clean { db, dry_run } => {
                    let store = open_store(db, &config).await?;
                    let report = clean(&store, &config, dry_run).await?;
                    if report.deleted.is_empty() {
                        println!("nothing to clean");
                    }
                    for name in &report.deleted {
                        println!("{} {name}", if dry_run { "would delete" } else { "deleted" });
                    }
                    for name in &report.failed {
                        eprintln!("failed to delete {name}");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn open_store(db: Option<PathBuf>, config: &AppConfig) -> Result<PartitionStore> {
    let path = db.unwrap_or_else(|| config.db_path.clone());
    PartitionStore::open(&path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))
}

async fn list(store: &PartitionStore, config: &AppConfig) -> Result<Vec<String>> {
    let allow = config.proxy.allow_list();
    Ok(store
        .partition_stats()
        .await?
        .into_iter()
        .map(|p| {
            let marker = if allow.contains(&p.name) { ' ' } else { '*' };
            format!("{marker} {:<32} {:>6} entries {:>12} bytes", p.name, p.entries, p.bytes)
        })
        .collect())
}

async fn clean(store: &PartitionStore, config: &AppConfig, dry_run: bool) -> Result<CleanupReport> {
    let mut manager = GenerationManager::new(config.proxy.allow_list());
    if dry_run {
        let deleted = manager.stale_partitions(store).await?;
        return Ok(CleanupReport { deleted, ..CleanupReport::default() });
    }
    Ok(manager.activate(store).await?)
}
