// ABOUTME: Utility functions for validation and error handling
// ABOUTME: Provides connection string validation, retry logic, and log sanitization

use anyhow::{bail, Result};
use std::time::Duration;

/// Validate a Redis connection URL
///
/// Checks that the URL has proper format and required components:
/// - Starts with "redis://" or "rediss://" (TLS)
/// - Contains a host component after the scheme
///
/// # Arguments
///
/// * `url` - Connection URL to validate
///
/// # Returns
///
/// Returns `Ok(())` if the connection URL is valid.
///
/// # Errors
///
/// Returns an error with helpful message if the connection URL is:
/// - Empty or whitespace only
/// - Missing proper scheme (redis:// or rediss://)
/// - Missing a host
///
/// # Examples
///
/// ```
/// # use redis_keys_migrator::utils::validate_connection_string;
/// # use anyhow::Result;
/// # fn example() -> Result<()> {
/// // Valid connection URLs
/// validate_connection_string("redis://localhost:6379/0")?;
/// validate_connection_string("rediss://:secret@cache.example.com:6380")?;
///
/// // Invalid - will return error
/// assert!(validate_connection_string("").is_err());
/// assert!(validate_connection_string("memcached://localhost:11211").is_err());
/// # Ok(())
/// # }
/// ```
pub fn validate_connection_string(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        bail!("Connection URL cannot be empty");
    }

    // Check for common URL schemes
    let rest = if let Some(rest) = url.strip_prefix("redis://") {
        rest
    } else if let Some(rest) = url.strip_prefix("rediss://") {
        rest
    } else {
        bail!(
            "Invalid connection URL format.\n\
             Expected format: redis://[:password@]host:port[/db]\n\
             Got: {}",
            url
        );
    };

    // Check for a host component (everything after optional credentials)
    let host_part = rest.rsplit('@').next().unwrap_or("");
    if host_part.is_empty() || host_part.starts_with('/') {
        bail!(
            "Connection URL missing host.\n\
             Expected format: redis://[:password@]host:port[/db]"
        );
    }

    Ok(())
}

/// Retry a function with exponential backoff
///
/// Executes an async operation with automatic retry on failure. Each retry doubles
/// the delay (exponential backoff) to handle transient failures gracefully.
///
/// # Arguments
///
/// * `operation` - Async function to retry (FnMut returning Future\<Output = Result\<T\>\>)
/// * `max_retries` - Maximum number of retry attempts (0 = no retries, just initial attempt)
/// * `initial_delay` - Delay before first retry (doubles each subsequent retry)
///
/// # Returns
///
/// Returns the successful result or the last error after all retries exhausted.
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use std::time::Duration;
/// # use redis_keys_migrator::utils::retry_with_backoff;
/// # async fn example() -> Result<()> {
/// let result = retry_with_backoff(
///     || async { Ok("success") },
///     3,  // Try up to 3 times
///     Duration::from_secs(1)  // Start with 1s delay
/// ).await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T>(
    mut operation: F,
    max_retries: u32,
    initial_delay: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = initial_delay;
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                last_error = Some(e);

                if attempt < max_retries {
                    tracing::warn!(
                        "Operation failed (attempt {}/{}), retrying in {:?}...",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2; // Exponential backoff
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Operation failed after retries")))
}

/// Sanitize a key name for display in logs and error messages
///
/// Removes control characters and limits length to prevent log injection attacks
/// and ensure readable error messages. Redis keys are arbitrary binary-safe
/// strings, so anything can show up here.
///
/// **Note**: This is for display purposes only; the migration itself always
/// operates on the original key.
///
/// # Arguments
///
/// * `key` - The key name to sanitize
///
/// # Returns
///
/// Sanitized string with control characters removed and length limited to 100 chars.
///
/// # Examples
///
/// ```
/// # use redis_keys_migrator::utils::sanitize_key;
/// assert_eq!(sanitize_key("session:1234"), "session:1234");
/// assert_eq!(sanitize_key("key\x00name"), "keyname");
/// assert_eq!(sanitize_key("key\nname"), "keyname");
///
/// // Length limit
/// let long_key = "a".repeat(200);
/// assert_eq!(sanitize_key(&long_key).len(), 100);
/// ```
pub fn sanitize_key(key: &str) -> String {
    // Remove any control characters and limit length for display
    key.chars().filter(|c| !c.is_control()).take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_connection_string_valid() {
        assert!(validate_connection_string("redis://localhost:6379/0").is_ok());
        assert!(validate_connection_string("redis://127.0.0.1:6381").is_ok());
        assert!(validate_connection_string("rediss://:secret@cache.example.com:6380/2").is_ok());
    }

    #[test]
    fn test_validate_connection_string_invalid() {
        assert!(validate_connection_string("").is_err());
        assert!(validate_connection_string("   ").is_err());
        assert!(validate_connection_string("memcached://localhost:11211").is_err());
        assert!(validate_connection_string("localhost:6379").is_err());
        assert!(validate_connection_string("redis://").is_err());
        // Credentials but no host
        assert!(validate_connection_string("redis://:secret@").is_err());
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("session:1234"), "session:1234");
        assert_eq!(sanitize_key("key\x00name"), "keyname");
        assert_eq!(sanitize_key("key\nname"), "keyname");

        // Test length limit
        let long_key = "a".repeat(200);
        assert_eq!(sanitize_key(&long_key).len(), 100);
    }

    #[tokio::test]
    async fn test_retry_with_backoff_success() {
        let mut attempts = 0;
        let result = retry_with_backoff(
            || {
                attempts += 1;
                async move {
                    if attempts < 3 {
                        anyhow::bail!("Temporary failure")
                    } else {
                        Ok("Success")
                    }
                }
            },
            5,
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Success");
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_with_backoff_failure() {
        let mut attempts = 0;
        let result: Result<&str> = retry_with_backoff(
            || {
                attempts += 1;
                async move { anyhow::bail!("Permanent failure") }
            },
            2,
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 3); // Initial + 2 retries
    }
}
