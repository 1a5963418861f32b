// ABOUTME: CLI entry point for redis-keys-migrator
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Args, Parser, Subcommand};
use redis_keys_migrator::commands;
use redis_keys_migrator::config::MigratorConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "redis-keys-migrator")]
#[command(about = "One-shot Redis key migration between instances", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct TuningArgs {
    /// SCAN MATCH pattern selecting the keys to migrate
    #[arg(long)]
    pattern: Option<String>,
    /// COUNT hint for each SCAN page
    #[arg(long)]
    scan_count: Option<usize>,
    /// Queued write operations per pipelined flush
    #[arg(long)]
    pipeline_size: Option<usize>,
    /// Already-present keys tolerated before the loop pauses
    #[arg(long)]
    existing_keys_pause_threshold: Option<u64>,
    /// Failed keys that abort the run early
    #[arg(long)]
    max_failed_keys: Option<u64>,
    /// Pause in seconds after each flush and each run of existing keys
    #[arg(long)]
    pause_secs: Option<u64>,
    /// Per-key failure log path (truncated at startup)
    #[arg(long)]
    error_log: Option<PathBuf>,
    /// Path to a TOML file with the same tuning knobs
    #[arg(long = "config")]
    config_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate both instances are reachable and ready for migration
    Validate {
        #[arg(long)]
        source: String,
        #[arg(long)]
        destination: String,
    },
    /// Copy every missing key from the source instance to the destination
    Migrate {
        #[arg(long)]
        source: String,
        #[arg(long)]
        destination: String,
        #[command(flatten)]
        tuning: TuningArgs,
    },
    /// Verify migrated keys hold the same content on both instances
    Verify {
        #[arg(long)]
        source: String,
        #[arg(long)]
        destination: String,
        /// SCAN MATCH pattern selecting the keys to check
        #[arg(long, default_value = "*")]
        pattern: String,
        /// Check at most this many randomly sampled keys
        #[arg(long)]
        sample: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            source,
            destination,
        } => commands::validate(&source, &destination).await,
        Commands::Migrate {
            source,
            destination,
            tuning,
        } => {
            let config = build_config(&tuning)?;
            commands::migrate(&source, &destination, &config).await
        }
        Commands::Verify {
            source,
            destination,
            pattern,
            sample,
        } => commands::verify(&source, &destination, &pattern, sample).await,
    }
}

fn build_config(args: &TuningArgs) -> anyhow::Result<MigratorConfig> {
    let mut config = match &args.config_path {
        Some(path) => MigratorConfig::from_file(path)?,
        None => MigratorConfig::default(),
    };

    // CLI flags win over the config file
    if let Some(pattern) = &args.pattern {
        config.scan_pattern = pattern.clone();
    }
    if let Some(scan_count) = args.scan_count {
        config.scan_count = scan_count;
    }
    if let Some(pipeline_size) = args.pipeline_size {
        config.pipeline_size = pipeline_size;
    }
    if let Some(threshold) = args.existing_keys_pause_threshold {
        config.existing_keys_pause_threshold = threshold;
    }
    if let Some(max_failed) = args.max_failed_keys {
        config.max_failed_keys = max_failed;
    }
    if let Some(pause) = args.pause_secs {
        config.pause_secs = pause;
    }
    if let Some(error_log) = &args.error_log {
        config.error_log = error_log.clone();
    }

    config.validate()?;
    Ok(config)
}
