// ABOUTME: Pre-flight validation command for migration readiness
// ABOUTME: Checks connectivity and reports version and keyspace size per endpoint

use crate::store;
use anyhow::{Context, Result};

pub async fn validate(source_url: &str, destination_url: &str) -> Result<()> {
    tracing::info!("Starting validation...");

    // Step 1: Connect to source
    tracing::info!("Connecting to source instance...");
    let mut source = store::connect(source_url)
        .await
        .context("Failed to connect to source Redis instance")?;
    tracing::info!("✓ Connected to source");

    // Step 2: Connect to destination
    tracing::info!("Connecting to destination instance...");
    let mut destination = store::connect(destination_url)
        .await
        .context("Failed to connect to destination Redis instance")?;
    tracing::info!("✓ Connected to destination");

    // Step 3: Report both endpoints
    let source_version = source.server_version().await?;
    let source_keys = source.key_count().await?;
    tracing::info!(
        "✓ Source: Redis {} holding {} key(s)",
        source_version,
        source_keys
    );

    let destination_version = destination.server_version().await?;
    let destination_keys = destination.key_count().await?;
    tracing::info!(
        "✓ Destination: Redis {} holding {} key(s)",
        destination_version,
        destination_keys
    );

    if destination_keys > 0 {
        tracing::warn!(
            "⚠ Destination is not empty; keys that already exist there will be skipped, never overwritten"
        );
    }

    tracing::info!("✅ Validation complete - ready for migration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn test_validate_with_live_instances_succeeds() {
        let source = std::env::var("TEST_SOURCE_REDIS_URL").unwrap();
        let destination = std::env::var("TEST_DEST_REDIS_URL").unwrap();

        let result = validate(&source, &destination).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_validate_with_invalid_source_fails() {
        let result = validate("invalid-url", "redis://localhost:6379").await;
        assert!(result.is_err());
    }
}
