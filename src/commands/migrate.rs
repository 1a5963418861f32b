// ABOUTME: Migrate command implementation - the one-shot key migration
// ABOUTME: Connects both endpoints, runs the key loop, and prints the final summary

use crate::config::MigratorConfig;
use crate::migration::{ErrorLog, Migrator};
use crate::store;
use crate::utils;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

/// Run the one-shot key migration from source to destination
///
/// This command performs the whole migration in a single pass:
/// 1. Connects to both instances (with retry) and confirms liveness
/// 2. Scans the source keyspace with a server-side cursor
/// 3. Skips keys the destination already has, copies the rest by type
/// 4. Flushes queued writes in pipelined batches, pausing after each flush
/// 5. Prints the restored / skipped / failed summary
///
/// Per-key failures do not fail the command: they are counted, written to
/// the error log, and reported in the summary, and the process still exits
/// zero. The command fails (non-zero exit) only when an endpoint cannot be
/// reached, a write batch cannot be executed, or the error log cannot be
/// written. Key TTLs are not copied.
///
/// # Arguments
///
/// * `source_url` - Redis URL of the instance to read from
/// * `destination_url` - Redis URL of the instance to write to
/// * `config` - Tuning knobs (pattern, batch sizes, pauses, ceilings)
///
/// # Errors
///
/// This function will return an error if:
/// - Either connection URL is invalid or unreachable
/// - The error log file cannot be created or written
/// - The keyspace scan or a pipelined batch execute fails mid-run
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use redis_keys_migrator::commands::migrate;
/// # use redis_keys_migrator::config::MigratorConfig;
/// # async fn example() -> Result<()> {
/// migrate(
///     "redis://localhost:6381/0",
///     "redis://localhost:6380/0",
///     &MigratorConfig::default(),
/// ).await?;
/// # Ok(())
/// # }
/// ```
pub async fn migrate(
    source_url: &str,
    destination_url: &str,
    config: &MigratorConfig,
) -> Result<()> {
    config.validate()?;
    // Validate both URLs up front so a typo fails immediately instead of
    // burning connection retries.
    utils::validate_connection_string(source_url)?;
    utils::validate_connection_string(destination_url)?;

    tracing::info!("Starting key migration...");

    tracing::info!("Connecting to source instance...");
    let mut source = store::connect_with_retry(source_url)
        .await
        .context("Failed to connect to source Redis instance")?;

    tracing::info!("Connecting to destination instance...");
    let mut destination = store::connect_with_retry(destination_url)
        .await
        .context("Failed to connect to destination Redis instance")?;

    println!("Connected to Redis instances successfully");

    // DBSIZE only estimates the workload: MATCH patterns narrow it and
    // concurrent writes move it. The bar length is a hint, nothing more.
    let estimated_keys = source.key_count().await?;
    tracing::info!("Source reports {} key(s) to consider", estimated_keys);

    let mut error_log = ErrorLog::create(&config.error_log).with_context(|| {
        format!(
            "Failed to create error log at {}",
            config.error_log.display()
        )
    })?;

    let progress = ProgressBar::new(estimated_keys);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let pb = progress.clone();
    let migrator = Migrator::new(config.clone()).with_progress(move |counters| {
        pb.set_position(counters.processed());
        pb.set_message(format!(
            "restored {} / skipped {} / failed {}",
            counters.restored, counters.skipped, counters.failed
        ));
    });

    let report = migrator
        .run(&mut source, &mut destination, &mut error_log)
        .await?;

    progress.finish_with_message("Migration complete");

    if report.aborted {
        tracing::warn!(
            "⚠ Run stopped early after {} failed key(s); the keyspace scan did not finish",
            report.counters.failed
        );
    }
    tracing::info!("Run finished in {:.1?}", report.duration);

    println!();
    println!("Number of restored keys: {}", report.counters.restored);
    println!("Number of skipped keys: {}", report.counters.skipped);
    println!("Number of failed keys: {}", report.counters.failed);

    if report.counters.failed > 0 {
        println!(
            "Errors occurred during the execution. Check |{}| for details",
            error_log.path().display()
        );
    }

    Ok(())
}
