//! quip-export main entry point
//!
//! This is the command-line interface for the quip-export document migrator.

use anyhow::Context;
use clap::Parser;
use quip_export::checkpoint::{CheckpointStore, JsonFileStore};
use quip_export::config::{
    compute_config_hash, read_config, validate, AssetBackend, AssetsConfig, Config,
};
use quip_export::crawler::{shutdown_signal, Coordinator, RunOptions, ShutdownReason, StartMode};
#[cfg(feature = "s3")]
use quip_export::pipeline::S3AssetStore;
use quip_export::pipeline::{AssetRelocation, AssetStore, LocalAssetStore, Pipeline};
use quip_export::sinks::{FilesystemSink, NotionSink, SinkDispatch};
use quip_export::source::SourceClient;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status after a termination signal
const EXIT_INTERRUPTED: u8 = 130;

/// quip-export: a resumable document migrator
///
/// quip-export walks the folder tree of a Quip-style document service and
/// copies every document into the enabled sinks. Progress is checkpointed,
/// so an interrupted or rate-limited run picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "quip-export")]
#[command(version = "1.0.0")]
#[command(about = "A resumable document migrator", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Bearer token for the source service
    #[arg(long, env = "QUIP_TOKEN", hide_env_values = true)]
    source_token: Option<String>,

    /// Integration token for the Notion workspace
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    notion_token: Option<String>,

    /// Page that top-level folders are created under
    #[arg(long)]
    notion_root_page: Option<String>,

    /// Comma-separated list of sinks to run (fs, notion)
    #[arg(short, long, value_delimiter = ',')]
    sinks: Option<Vec<String>>,

    /// Upload embedded images and rewrite their sources
    #[arg(long)]
    relocate_assets: bool,

    /// Upload embedded images to this S3 bucket (implies --relocate-assets)
    #[arg(long)]
    aws_bucket: Option<String>,

    /// Region of the S3 bucket
    #[arg(long)]
    aws_region: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard any saved checkpoint and start from the seed folders
    #[arg(long, conflicts_with_all = ["status", "dry_run"])]
    fresh: bool,

    /// Validate config and show the resolved settings without exporting
    #[arg(long, conflicts_with = "status")]
    dry_run: bool,

    /// Show the saved checkpoint and exit
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run_cli(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    let (config, config_hash) = resolve_config(&cli)?;

    if cli.status {
        handle_status(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(ExitCode::SUCCESS);
    }

    handle_export(config, config_hash, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("quip_export=info,warn"),
            1 => EnvFilter::new("quip_export=debug,info"),
            2 => EnvFilter::new("quip_export=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Reads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let config = read_config(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            let hash = compute_config_hash(path)?;
            tracing::debug!("Configuration hash: {}", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(token) = &cli.source_token {
        config.source.token = token.clone();
    }
    if let Some(token) = &cli.notion_token {
        config.notion.token = token.clone();
    }
    if let Some(page) = &cli.notion_root_page {
        config.notion.root_page = page.clone();
    }
    if let Some(sinks) = &cli.sinks {
        config.sinks.enabled = sinks.iter().map(|s| s.trim().to_string()).collect();
    }
    if cli.relocate_assets {
        config.assets.enabled = true;
    }
    if let Some(bucket) = &cli.aws_bucket {
        config.assets.enabled = true;
        config.assets.backend = AssetBackend::S3;
        config.assets.bucket = bucket.clone();
    }
    if let Some(region) = &cli.aws_region {
        config.assets.region = region.clone();
    }

    Ok((config, hash))
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== quip-export Dry Run ===\n");

    println!("Source:");
    println!("  API: {}", config.source.api_url);
    println!("  Token: {}", mask(&config.source.token));
    println!("  Seed folders: {:?}", config.source.seed);

    println!("\nCheckpoint:");
    println!("  Path: {}", config.checkpoint.path);
    match config.checkpoint.save_every {
        0 => println!("  Periodic saves: off"),
        n => println!("  Periodic saves: every {} folders", n),
    }

    println!("\nSinks ({}):", config.sinks.enabled.len());
    for sink in &config.sinks.enabled {
        match sink.as_str() {
            "fs" => println!("  - fs -> {}", config.filesystem.root),
            "notion" => println!(
                "  - notion -> page {} at {} (max {} blocks per page)",
                config.notion.root_page, config.notion.api_url, config.notion.max_blocks_per_page
            ),
            other => println!("  - {}", other),
        }
    }

    if config.assets.enabled {
        match config.assets.backend {
            AssetBackend::Local => println!(
                "\nAssets: relocated to {} as {}/...",
                config.assets.directory, config.assets.public_url
            ),
            AssetBackend::S3 => println!(
                "\nAssets: uploaded to s3://{} ({})",
                config.assets.bucket, config.assets.region
            ),
        }
    } else {
        println!("\nAssets: left in place");
    }

    println!("\n✓ Configuration is valid");
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        "(unset)".to_string()
    } else {
        format!("{}…", secret.chars().take(4).collect::<String>())
    }
}

/// Handles the --status mode: summarizes the saved checkpoint
fn handle_status(config: &Config) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&config.checkpoint.path);
    println!("Checkpoint: {}\n", store.location());

    if !store.exists() {
        println!("No checkpoint found, the next run starts fresh");
        return Ok(());
    }

    let checkpoint = store.load()?;
    println!("Written: {}", checkpoint.timestamp);
    println!("Folders visited: {}", checkpoint.visited.len().saturating_sub(1));
    println!("Folders pending: {}", checkpoint.frontier.folders.len());
    println!("Files pending: {}", checkpoint.frontier.files.len());
    for sink in &checkpoint.sinks {
        println!("Sink state saved: {}", sink.sink_id);
    }

    if checkpoint.is_complete() {
        println!("\n✓ Run complete, the next run starts a new pass (--fresh discards sink state)");
    } else {
        println!("\nRun incomplete, start again to resume");
    }

    Ok(())
}

/// Handles the main export operation
async fn handle_export(
    config: Config,
    config_hash: Option<String>,
    fresh: bool,
) -> anyhow::Result<ExitCode> {
    let mut store = JsonFileStore::new(&config.checkpoint.path);
    if fresh {
        tracing::info!("Starting fresh export (discarding previous state)");
        store.clear()?;
    }

    let client = SourceClient::new(&config.source.api_url, config.source.token.clone())?;
    let pipeline = build_pipeline(&config).await?;
    let sinks = build_sinks(&config)?;

    let options = RunOptions {
        seed: config.source.seed.clone(),
        save_every: config.checkpoint.save_every,
        config_hash,
    };
    let mut coordinator = Coordinator::new(client, pipeline, sinks, Box::new(store), options);

    match coordinator.resume_or_seed().await? {
        StartMode::Resumed => tracing::info!("Resuming previous export"),
        StartMode::Seeded => tracing::info!("Starting new export"),
    }

    // The run future is dropped at its current await point if the signal wins
    let outcome = tokio::select! {
        result = coordinator.run() => Some(result),
        _ = shutdown_signal() => None,
    };

    match outcome {
        Some(Ok(_)) => {
            tracing::info!("Export completed successfully");
            Ok(ExitCode::SUCCESS)
        }
        Some(Err(e)) if e.is_resumable() => {
            tracing::error!("{}; run again later to resume", e);
            Ok(ExitCode::FAILURE)
        }
        Some(Err(e)) => Err(e).context("Export failed"),
        None => {
            coordinator.shutdown(ShutdownReason::Signal)?;
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
    }
}

async fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let mut pipeline = Pipeline::new();
    if config.assets.enabled {
        let store = build_asset_store(&config.assets).await?;
        pipeline.register(Box::new(AssetRelocation::new(store)?));
    }
    Ok(pipeline)
}

async fn build_asset_store(assets: &AssetsConfig) -> anyhow::Result<Box<dyn AssetStore>> {
    match assets.backend {
        AssetBackend::Local => Ok(Box::new(LocalAssetStore::new(
            &assets.directory,
            assets.public_url.clone(),
        ))),
        #[cfg(feature = "s3")]
        AssetBackend::S3 => {
            tracing::info!("Uploading assets to s3://{}", assets.bucket);
            let store = S3AssetStore::connect(assets.bucket.clone(), assets.region.clone())
                .await
                .with_public_url(assets.public_url.clone());
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "s3"))]
        AssetBackend::S3 => anyhow::bail!("quip-export was built without the s3 feature"),
    }
}

fn build_sinks(config: &Config) -> anyhow::Result<SinkDispatch> {
    let mut sinks = SinkDispatch::new();
    for name in &config.sinks.enabled {
        match name.as_str() {
            "fs" => sinks.register(Box::new(FilesystemSink::new(&config.filesystem.root))),
            "notion" => {
                let sink = NotionSink::new(
                    &config.notion.api_url,
                    config.notion.token.clone(),
                    config.notion.root_page.clone(),
                    config.notion.max_blocks_per_page,
                )
                .context("Failed to build Notion client")?;
                sinks.register(Box::new(sink));
            }
            other => anyhow::bail!("Unknown sink '{}'", other),
        }
    }
    Ok(sinks)
}
