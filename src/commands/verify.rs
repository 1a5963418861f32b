// ABOUTME: Verify command implementation - sampled consistency check
// ABOUTME: Compares key contents between source and destination after a migration

use crate::migration::KeyspaceScanner;
use crate::store::{self, DestinationOps, KeyType, RedisStore, SourceOps};
use crate::utils::sanitize_key;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};

/// Verify that migrated keys hold the same content on both instances
///
/// This command is the post-migration check:
/// 1. Scans the source keyspace for keys matching `pattern`
/// 2. Optionally samples `sample` random keys instead of checking all
/// 3. Compares each key's destination content semantically per type
///    (string bytes, list order, set membership, hash fields, sorted-set
///    scores, stream entries in id order)
/// 4. Reports matched / mismatched / missing counts with per-key reasons
///
/// Uses parallel comparison (up to 4 keys in flight) over clones of the
/// multiplexed connections, with a progress bar.
///
/// # Arguments
///
/// * `source_url` - Redis URL of the migration source
/// * `destination_url` - Redis URL of the migration destination
/// * `pattern` - SCAN MATCH pattern selecting the keys to check
/// * `sample` - Check at most this many randomly chosen keys (all if `None`)
///
/// # Returns
///
/// Returns `Ok(())` when every checked key matches.
///
/// # Errors
///
/// This function will return an error if:
/// - Cannot connect to the source or destination instance
/// - The keyspace scan fails
/// - Any checked key is missing, differs, or cannot be read
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use redis_keys_migrator::commands::verify;
/// # async fn example() -> Result<()> {
/// verify(
///     "redis://localhost:6381/0",
///     "redis://localhost:6380/0",
///     "*",
///     Some(500),
/// ).await?;
/// # Ok(())
/// # }
/// ```
pub async fn verify(
    source_url: &str,
    destination_url: &str,
    pattern: &str,
    sample: Option<usize>,
) -> Result<()> {
    tracing::info!("Starting post-migration verification...");

    tracing::info!("Connecting to source instance...");
    let mut source = store::connect(source_url)
        .await
        .context("Failed to connect to source Redis instance")?;

    tracing::info!("Connecting to destination instance...");
    let destination = store::connect(destination_url)
        .await
        .context("Failed to connect to destination Redis instance")?;

    // Collect the candidate keys up front; the comparison pass runs
    // concurrently afterwards.
    tracing::info!("Scanning source keyspace (pattern: {})...", pattern);
    let mut scanner = KeyspaceScanner::new(pattern, 1000);
    let mut keys: Vec<String> = Vec::new();
    let mut undecodable: u64 = 0;
    while let Some(raw_key) = scanner.next_key(&mut source).await? {
        match String::from_utf8(raw_key) {
            Ok(key) => keys.push(key),
            Err(_) => undecodable += 1,
        }
    }
    if undecodable > 0 {
        tracing::warn!(
            "⚠ Skipped {} non-UTF-8 key(s); this tool only migrates text keys",
            undecodable
        );
    }

    if keys.is_empty() {
        tracing::warn!("⚠ No keys found to verify");
        return Ok(());
    }

    if let Some(limit) = sample {
        if keys.len() > limit {
            let mut rng = rand::thread_rng();
            keys.shuffle(&mut rng);
            keys.truncate(limit);
            tracing::info!("Sampling {} of the scanned keys", limit);
        }
    }

    let total = keys.len();
    tracing::info!("Checking {} key(s) (concurrency: 4)", total);

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let comparisons: Vec<(String, KeyComparison)> = stream::iter(keys.into_iter())
        .map(|key| {
            let mut source = source.clone();
            let mut destination = destination.clone();
            let pb = progress.clone();

            async move {
                let outcome = compare_key(&mut source, &mut destination, &key).await;
                pb.inc(1);
                (key, outcome)
            }
        })
        .buffer_unordered(4) // Compare up to 4 keys concurrently
        .collect()
        .await;

    progress.finish_with_message("Verification complete");

    let mut matched: u64 = 0;
    let mut mismatched: u64 = 0;
    let mut missing: u64 = 0;
    let mut errors: u64 = 0;

    for (key, outcome) in comparisons {
        match outcome {
            KeyComparison::Match => {
                matched += 1;
                tracing::debug!("  ✓ {}", sanitize_key(&key));
            }
            KeyComparison::Missing => {
                missing += 1;
                tracing::error!("  ✗ {}: missing at destination", sanitize_key(&key));
            }
            KeyComparison::Mismatch(reason) => {
                mismatched += 1;
                tracing::error!("  ✗ {}: {}", sanitize_key(&key), reason);
            }
            KeyComparison::Error(reason) => {
                errors += 1;
                tracing::error!("  ✗ {}: {}", sanitize_key(&key), reason);
            }
        }
    }

    tracing::info!("");
    tracing::info!("========================================");
    tracing::info!("Verification Summary");
    tracing::info!("========================================");
    tracing::info!("Keys checked: {}", total);
    tracing::info!("✓ Matches: {}", matched);
    tracing::info!("✗ Mismatches: {}", mismatched);
    tracing::info!("✗ Missing: {}", missing);
    if errors > 0 {
        tracing::info!("⚠ Read errors: {}", errors);
    }
    tracing::info!("========================================");

    let failed = mismatched + missing + errors;
    if failed > 0 {
        tracing::error!("⚠ CONSISTENCY ISSUES DETECTED!");
        tracing::error!("  {} key(s) differ between the instances", failed);
        tracing::error!("  Review the logs above for details");
        anyhow::bail!("{} key(s) failed verification", failed);
    }

    tracing::info!("✓ ALL CHECKED KEYS MATCH!");
    tracing::info!(
        "  All {} key(s) hold the same content on both instances",
        matched
    );
    Ok(())
}

/// Outcome of comparing one key between the two instances.
enum KeyComparison {
    Match,
    Missing,
    Mismatch(String),
    Error(String),
}

async fn compare_key(
    source: &mut RedisStore,
    destination: &mut RedisStore,
    key: &str,
) -> KeyComparison {
    let kind = match source.type_of(key).await {
        Ok(kind) => kind,
        Err(e) => return KeyComparison::Error(format!("source type lookup failed: {e}")),
    };
    if let KeyType::Unsupported(tag) = &kind {
        // "none" means the key vanished since the scan; anything else is a
        // type this tool never migrates in the first place.
        return KeyComparison::Error(format!("source reports uncheckable type {tag:?}"));
    }

    match destination.exists(key).await {
        Ok(true) => {}
        Ok(false) => return KeyComparison::Missing,
        Err(e) => return KeyComparison::Error(format!("destination existence check failed: {e}")),
    }

    let destination_kind = match destination.type_of(key).await {
        Ok(kind) => kind,
        Err(e) => return KeyComparison::Error(format!("destination type lookup failed: {e}")),
    };
    if destination_kind != kind {
        return KeyComparison::Mismatch(format!(
            "type differs: source={kind}, destination={destination_kind}"
        ));
    }

    match kind {
        KeyType::String => {
            let ours = match source.get_string(key).await {
                Ok(Some(value)) => value,
                Ok(None) => return KeyComparison::Error("source value vanished".to_string()),
                Err(e) => return KeyComparison::Error(format!("source read failed: {e}")),
            };
            let theirs = match destination.get_string(key).await {
                Ok(Some(value)) => value,
                Ok(None) => return KeyComparison::Missing,
                Err(e) => return KeyComparison::Error(format!("destination read failed: {e}")),
            };
            if ours == theirs {
                KeyComparison::Match
            } else {
                KeyComparison::Mismatch("string value differs".to_string())
            }
        }
        KeyType::List => {
            let ours = match source.list_range(key, 0, -1).await {
                Ok(values) => values,
                Err(e) => return KeyComparison::Error(format!("source read failed: {e}")),
            };
            let theirs = match destination.list_range(key, 0, -1).await {
                Ok(values) => values,
                Err(e) => return KeyComparison::Error(format!("destination read failed: {e}")),
            };
            if ours == theirs {
                KeyComparison::Match
            } else {
                KeyComparison::Mismatch(format!(
                    "list contents differ ({} vs {} item(s))",
                    ours.len(),
                    theirs.len()
                ))
            }
        }
        KeyType::Set => {
            let ours: HashSet<Vec<u8>> = match source.set_members(key).await {
                Ok(members) => members.into_iter().collect(),
                Err(e) => return KeyComparison::Error(format!("source read failed: {e}")),
            };
            let theirs: HashSet<Vec<u8>> = match destination.set_members(key).await {
                Ok(members) => members.into_iter().collect(),
                Err(e) => return KeyComparison::Error(format!("destination read failed: {e}")),
            };
            if ours == theirs {
                KeyComparison::Match
            } else {
                KeyComparison::Mismatch(format!(
                    "set membership differs ({} vs {} member(s))",
                    ours.len(),
                    theirs.len()
                ))
            }
        }
        KeyType::Hash => {
            let ours: HashMap<Vec<u8>, Vec<u8>> = match source.hash_fields(key).await {
                Ok(fields) => fields.into_iter().collect(),
                Err(e) => return KeyComparison::Error(format!("source read failed: {e}")),
            };
            let theirs: HashMap<Vec<u8>, Vec<u8>> = match destination.hash_fields(key).await {
                Ok(fields) => fields.into_iter().collect(),
                Err(e) => return KeyComparison::Error(format!("destination read failed: {e}")),
            };
            if ours == theirs {
                KeyComparison::Match
            } else {
                KeyComparison::Mismatch(format!(
                    "hash fields differ ({} vs {} field(s))",
                    ours.len(),
                    theirs.len()
                ))
            }
        }
        KeyType::SortedSet => {
            let ours: HashMap<Vec<u8>, f64> = match source.sorted_set_with_scores(key).await {
                Ok(members) => members.into_iter().collect(),
                Err(e) => return KeyComparison::Error(format!("source read failed: {e}")),
            };
            let theirs: HashMap<Vec<u8>, f64> =
                match destination.sorted_set_with_scores(key).await {
                    Ok(members) => members.into_iter().collect(),
                    Err(e) => {
                        return KeyComparison::Error(format!("destination read failed: {e}"))
                    }
                };
            if ours == theirs {
                KeyComparison::Match
            } else {
                KeyComparison::Mismatch(format!(
                    "sorted-set members or scores differ ({} vs {} member(s))",
                    ours.len(),
                    theirs.len()
                ))
            }
        }
        KeyType::Stream => {
            let ours = match source.stream_entries(key).await {
                Ok(entries) => entries,
                Err(e) => return KeyComparison::Error(format!("source read failed: {e}")),
            };
            let theirs = match destination.stream_entries(key).await {
                Ok(entries) => entries,
                Err(e) => return KeyComparison::Error(format!("destination read failed: {e}")),
            };
            if ours == theirs {
                KeyComparison::Match
            } else {
                KeyComparison::Mismatch(format!(
                    "stream entries differ ({} vs {} entry(ies))",
                    ours.len(),
                    theirs.len()
                ))
            }
        }
        KeyType::Unsupported(_) => unreachable!("filtered above"),
    }
}
