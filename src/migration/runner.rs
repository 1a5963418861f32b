// ABOUTME: The sequential migration loop
// ABOUTME: Drives scan, decode, skip-or-copy, and paced batch flushing to completion

use crate::config::MigratorConfig;
use crate::error::RunError;
use crate::migration::batch::WriteBatcher;
use crate::migration::copier::copy_key;
use crate::migration::error_log::ErrorLog;
use crate::migration::scanner::KeyspaceScanner;
use crate::store::{DestinationOps, SourceOps};
use crate::utils::sanitize_key;
use std::time::{Duration, Instant};

/// Counters for one migration run.
///
/// Every scanned key lands in exactly one of the three buckets, so
/// `processed()` always equals the number of keys taken off the scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Keys copied to the destination (queued and eventually flushed).
    pub restored: u64,
    /// Keys left untouched because the destination already had them.
    pub skipped: u64,
    /// Keys that could not be copied; details are in the error log.
    pub failed: u64,
}

impl RunCounters {
    pub fn processed(&self) -> u64 {
        self.restored + self.skipped + self.failed
    }
}

/// Outcome of a completed (or early-aborted) migration run.
#[derive(Debug)]
pub struct MigrationReport {
    pub counters: RunCounters,
    /// True when the failed-keys ceiling stopped the scan before the
    /// cursor completed.
    pub aborted: bool,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

type ProgressFn = Box<dyn Fn(&RunCounters) + Send + Sync>;

/// The migration loop.
///
/// Strictly sequential: one key in flight at a time, one store call at a
/// time. Pacing is count-driven, not timer-driven: a fixed pause after
/// every batch flush and after every run of already-present keys, and
/// nothing else sleeps.
///
/// Per-key failures are absorbed into the counters and the error log; the
/// only errors that escape `run` are the run-fatal ones: scan failures,
/// existence-check failures, batch-execute failures, and an unwritable
/// error log.
pub struct Migrator {
    config: MigratorConfig,
    progress: Option<ProgressFn>,
}

impl Migrator {
    pub fn new(config: MigratorConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Install a progress callback, invoked after every processed key.
    pub fn with_progress(
        mut self,
        progress: impl Fn(&RunCounters) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Migrate every key the scanner yields.
    ///
    /// On a normal finish the scan is complete and everything queued has
    /// been flushed. On an early abort (ceiling hit) the queued writes are
    /// still flushed before returning, so the report's counters describe
    /// destination state either way.
    pub async fn run<S: SourceOps, D: DestinationOps>(
        &self,
        source: &mut S,
        destination: &mut D,
        error_log: &mut ErrorLog,
    ) -> Result<MigrationReport, RunError> {
        let started = Instant::now();
        let mut scanner = KeyspaceScanner::new(&self.config.scan_pattern, self.config.scan_count);
        let mut batch = WriteBatcher::new();
        let mut counters = RunCounters::default();
        // Already-present keys seen since the last pause. Separate from
        // counters.skipped, which is cumulative for the whole run.
        let mut existing_tally: u64 = 0;
        let mut aborted = false;

        while let Some(raw_key) = scanner.next_key(source).await.map_err(RunError::Scan)? {
            match String::from_utf8(raw_key) {
                Ok(key) => {
                    let already_present = destination
                        .exists(&key)
                        .await
                        .map_err(RunError::ExistenceCheck)?;

                    if already_present {
                        counters.skipped += 1;
                        existing_tally += 1;
                        tracing::debug!("Key already present, skipping: {}", sanitize_key(&key));
                    } else {
                        match copy_key(source, &key, &mut batch).await {
                            Ok(()) => counters.restored += 1,
                            Err(e) => {
                                counters.failed += 1;
                                tracing::debug!(
                                    "Failed to copy key {}: {}",
                                    sanitize_key(&key),
                                    e
                                );
                                error_log.record(&key, e.stage(), &e)?;
                            }
                        }
                    }
                }
                Err(e) => {
                    // Only text keys are migrated; a non-UTF-8 key is a
                    // per-key failure, shown lossily in the log.
                    counters.failed += 1;
                    let shown = String::from_utf8_lossy(e.as_bytes()).into_owned();
                    error_log.record(&shown, "key decode", &e)?;
                }
            }

            if let Some(progress) = &self.progress {
                progress(&counters);
            }

            // Long runs of already-present keys mean a previous migration
            // got here first; back off instead of hammering the endpoints.
            if existing_tally >= self.config.existing_keys_pause_threshold {
                tracing::info!(
                    "Destination already had {} of the recent keys, pausing for {}s",
                    existing_tally,
                    self.config.pause_secs
                );
                existing_tally = 0;
                tokio::time::sleep(self.config.pause()).await;
            }

            let flushed = batch
                .flush_if_full(destination, self.config.pipeline_size)
                .await?;
            if flushed > 0 {
                tracing::info!(
                    "Flushed {} write operation(s), pausing for {}s",
                    flushed,
                    self.config.pause_secs
                );
                tokio::time::sleep(self.config.pause()).await;
            }

            if counters.failed >= self.config.max_failed_keys {
                tracing::warn!(
                    "⚠ Reached the failed-keys ceiling ({}), stopping the scan early",
                    counters.failed
                );
                aborted = true;
                break;
            }
        }

        // Queued writes go out even on an early abort; they belong to keys
        // already counted as restored.
        let flushed = batch.flush(destination).await?;
        if flushed > 0 {
            tracing::info!("Final flush wrote {} operation(s)", flushed);
        }

        Ok(MigrationReport {
            counters,
            aborted,
            duration: started.elapsed(),
        })
    }
}
