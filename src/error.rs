// ABOUTME: Error types for the migration library core
// ABOUTME: Separates recoverable per-key copy failures from run-fatal store failures

use crate::store::KeyType;
use thiserror::Error;

/// An error from the underlying key-value store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error surfaced by the Redis driver.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The connection could not be established or has been lost.
    #[error("connection error: {0}")]
    Connection(String),

    /// A failure synthesized outside the Redis driver. In-memory test
    /// stores use this for fault injection.
    #[error("{0}")]
    Fault(String),
}

/// Why a single key could not be copied.
///
/// These are the recoverable failures: the migration records them in the
/// error log, counts them, and moves on to the next key.
#[derive(Debug, Error)]
pub enum CopyError {
    /// The TYPE lookup for the key failed.
    #[error("type lookup failed: {0}")]
    TypeLookup(#[source] StoreError),

    /// The key reported a type this tool does not know how to copy.
    /// Carries the wire tag exactly as the server sent it.
    #[error("unknown key type {0:?}")]
    UnsupportedType(String),

    /// The value disappeared between the type lookup and the read
    /// (deleted or expired mid-flight).
    #[error("{kind} value vanished before it could be read")]
    Vanished { kind: KeyType },

    /// Reading the key's value failed.
    #[error("reading {kind} value failed: {source}")]
    Read {
        kind: KeyType,
        #[source]
        source: StoreError,
    },
}

impl CopyError {
    /// Short stage tag for error-log entries.
    pub fn stage(&self) -> &'static str {
        match self {
            CopyError::TypeLookup(_) => "type lookup",
            CopyError::UnsupportedType(_) => "type dispatch",
            CopyError::Vanished { .. } | CopyError::Read { .. } => "copy",
        }
    }
}

/// A failure that terminates the whole migration run.
///
/// Per-key failures never show up here; everything in this enum means the
/// loop cannot meaningfully continue.
#[derive(Debug, Error)]
pub enum RunError {
    /// The keyspace scan itself failed. Without a cursor there is nothing
    /// left to iterate.
    #[error("keyspace scan failed: {0}")]
    Scan(#[source] StoreError),

    /// The destination existence check failed.
    #[error("destination existence check failed: {0}")]
    ExistenceCheck(#[source] StoreError),

    /// Executing a queued write batch failed. All writes in that batch
    /// are lost; `lost` reports how many operations were queued.
    #[error("write batch of {lost} operation(s) failed to execute: {source}")]
    BatchExecute {
        lost: usize,
        #[source]
        source: StoreError,
    },

    /// The per-key error log could not be written.
    #[error("error log write failed: {0}")]
    ErrorLog(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_error_stages() {
        assert_eq!(
            CopyError::TypeLookup(StoreError::Fault("boom".into())).stage(),
            "type lookup"
        );
        assert_eq!(
            CopyError::UnsupportedType("geoindex".into()).stage(),
            "type dispatch"
        );
        assert_eq!(CopyError::Vanished { kind: KeyType::List }.stage(), "copy");
        assert_eq!(
            CopyError::Read {
                kind: KeyType::Hash,
                source: StoreError::Fault("boom".into()),
            }
            .stage(),
            "copy"
        );
    }

    #[test]
    fn run_error_reports_lost_batch_size() {
        let err = RunError::BatchExecute {
            lost: 42,
            source: StoreError::Connection("reset by peer".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("42 operation(s)"), "got: {msg}");
    }

    #[test]
    fn unsupported_type_keeps_wire_tag() {
        let err = CopyError::UnsupportedType("ReJSON-RL".into());
        assert!(err.to_string().contains("ReJSON-RL"));
    }
}
