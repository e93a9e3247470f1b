use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use factgraph_common::{Config, RawItem};
use factgraph_graph::migrate::migrate;
use factgraph_ingest::{graph_client, prepare_dataset_items, IngestDeps};

/// Ingest a file of posts or dataset rows into the fact graph.
#[derive(Parser, Debug)]
#[command(name = "factgraph-ingest")]
struct Cli {
    /// JSON array or JSON-lines file of items.
    #[arg(long)]
    file: PathBuf,

    /// Treat the file as rows of this dataset: ids become
    /// `<dataset>_<split>_<n>` and the load is capped.
    #[arg(long)]
    dataset: Option<String>,

    #[arg(long, default_value = "train")]
    split: String,

    /// Overrides INGEST_BATCH_SIZE.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Overrides INGEST_BATCH_PAUSE_MS.
    #[arg(long)]
    pause_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("factgraph=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let raw = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;
    let mut items = parse_items(&raw)?;
    if let Some(dataset) = &cli.dataset {
        items = prepare_dataset_items(dataset, &cli.split, items);
    }
    info!(file = %cli.file.display(), items = items.len(), "Loaded items");

    let client = graph_client(&config);
    migrate(&client).await?;

    let mut deps = IngestDeps::from_config(&config, client);
    if let Some(size) = cli.batch_size {
        deps.batch_size = size;
    }
    if let Some(ms) = cli.pause_ms {
        deps.batch_pause = Duration::from_millis(ms);
    }

    let report = deps.batcher().ingest_batch(&items).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// A JSON array of objects, or one object per line.
fn parse_items(raw: &str) -> Result<Vec<RawItem>> {
    if raw.trim_start().starts_with('[') {
        return serde_json::from_str(raw).context("parsing JSON array of items");
    }
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("parsing line {}", n + 1))
        })
        .collect()
}
