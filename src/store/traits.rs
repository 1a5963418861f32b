// ABOUTME: Store-facing vocabulary: key types, write operations, and the
// ABOUTME: source/destination traits the migration loop is generic over

use crate::error::StoreError;
use std::fmt;

/// The type of a Redis key, as reported by the `TYPE` command.
///
/// Anything outside the six types this tool knows how to copy lands in
/// `Unsupported`, carrying the wire tag verbatim. `TYPE` answers `"none"`
/// for a missing key; that also parses as `Unsupported("none")` so the
/// caller treats a key that vanished before its type lookup the same way
/// as a module type it cannot handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    String,
    List,
    Set,
    Hash,
    SortedSet,
    Stream,
    Unsupported(String),
}

impl KeyType {
    /// Parse a `TYPE` reply tag.
    pub fn from_wire(tag: &str) -> KeyType {
        match tag {
            "string" => KeyType::String,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "hash" => KeyType::Hash,
            "zset" => KeyType::SortedSet,
            "stream" => KeyType::Stream,
            other => KeyType::Unsupported(other.to_string()),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::String => f.write_str("string"),
            KeyType::List => f.write_str("list"),
            KeyType::Set => f.write_str("set"),
            KeyType::Hash => f.write_str("hash"),
            KeyType::SortedSet => f.write_str("zset"),
            KeyType::Stream => f.write_str("stream"),
            KeyType::Unsupported(tag) => f.write_str(tag),
        }
    }
}

/// One entry of a stream key: its id plus the field/value pairs in the
/// order the server listed them.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: String,
    pub fields: Vec<(String, Vec<u8>)>,
}

/// A single write queued for the destination.
///
/// Each variant maps onto exactly one destination command; a batch of
/// these executes as one pipelined round trip. Values are raw bytes
/// because Redis values are binary-safe even when keys are text.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// `SET key value`
    Set { key: String, value: Vec<u8> },
    /// `RPUSH key v1 v2 ...` preserving list order
    ListAppendAll { key: String, values: Vec<Vec<u8>> },
    /// `SADD key m1 m2 ...`
    SetAddAll { key: String, members: Vec<Vec<u8>> },
    /// `HSET key f1 v1 f2 v2 ...`
    HashSetAll { key: String, fields: Vec<(Vec<u8>, Vec<u8>)> },
    /// `ZADD key s1 m1 s2 m2 ...` with (score, member) pairs
    SortedSetAddAll { key: String, members: Vec<(f64, Vec<u8>)> },
    /// `XADD key id f1 v1 ...` (one op per stream entry, explicit id)
    StreamAppend {
        key: String,
        id: String,
        fields: Vec<(String, Vec<u8>)>,
    },
}

/// Read-side operations the migration needs from the source instance.
///
/// The migration loop is generic over this trait so tests can drive it
/// with an in-memory store; `RedisStore` is the production implementation.
/// Methods take `&mut self` because the underlying multiplexed connection
/// does.
#[allow(async_fn_in_trait)]
pub trait SourceOps {
    /// Liveness check (`PING`).
    async fn ping(&mut self) -> Result<(), StoreError>;

    /// One page of a cursor scan: `SCAN cursor MATCH pattern COUNT count`.
    ///
    /// Returns the next cursor and the keys found on this page. A next
    /// cursor of 0 means the scan is complete. Pages may be empty even
    /// while the cursor is nonzero; keys are raw bytes because the server
    /// does not promise UTF-8.
    async fn scan_page(
        &mut self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<Vec<u8>>), StoreError>;

    /// `TYPE key`, parsed into [`KeyType`].
    async fn type_of(&mut self, key: &str) -> Result<KeyType, StoreError>;

    /// `GET key`; `None` when the key no longer holds a string value.
    async fn get_string(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// `LRANGE key start stop` in list order.
    async fn list_range(
        &mut self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<Vec<u8>>, StoreError>;

    /// `SMEMBERS key`.
    async fn set_members(&mut self, key: &str) -> Result<Vec<Vec<u8>>, StoreError>;

    /// `HGETALL key` as (field, value) pairs in reply order.
    async fn hash_fields(&mut self, key: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// `ZRANGE key 0 -1 WITHSCORES` as (member, score) pairs in rank order.
    async fn sorted_set_with_scores(
        &mut self,
        key: &str,
    ) -> Result<Vec<(Vec<u8>, f64)>, StoreError>;

    /// `XRANGE key - +` in ascending id order.
    async fn stream_entries(&mut self, key: &str) -> Result<Vec<StreamEntry>, StoreError>;

    /// `DBSIZE`, used for progress estimates and endpoint reports.
    async fn key_count(&mut self) -> Result<u64, StoreError>;
}

/// Write-side operations the migration needs from the destination
/// instance.
#[allow(async_fn_in_trait)]
pub trait DestinationOps {
    /// Liveness check (`PING`).
    async fn ping(&mut self) -> Result<(), StoreError>;

    /// `EXISTS key`.
    async fn exists(&mut self, key: &str) -> Result<bool, StoreError>;

    /// Execute every queued operation in one pipelined round trip.
    ///
    /// Failure means the whole batch is lost; callers treat that as fatal
    /// rather than retrying half-applied writes.
    async fn execute_batch(&mut self, ops: &[WriteOp]) -> Result<(), StoreError>;

    /// `DBSIZE`.
    async fn key_count(&mut self) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_type_from_wire_covers_the_copyable_types() {
        assert_eq!(KeyType::from_wire("string"), KeyType::String);
        assert_eq!(KeyType::from_wire("list"), KeyType::List);
        assert_eq!(KeyType::from_wire("set"), KeyType::Set);
        assert_eq!(KeyType::from_wire("hash"), KeyType::Hash);
        assert_eq!(KeyType::from_wire("zset"), KeyType::SortedSet);
        assert_eq!(KeyType::from_wire("stream"), KeyType::Stream);
    }

    #[test]
    fn key_type_from_wire_keeps_unknown_tags() {
        assert_eq!(
            KeyType::from_wire("none"),
            KeyType::Unsupported("none".to_string())
        );
        assert_eq!(
            KeyType::from_wire("ReJSON-RL"),
            KeyType::Unsupported("ReJSON-RL".to_string())
        );
    }

    #[test]
    fn key_type_display_matches_wire_tags() {
        for tag in ["string", "list", "set", "hash", "zset", "stream"] {
            assert_eq!(KeyType::from_wire(tag).to_string(), tag);
        }
        assert_eq!(KeyType::Unsupported("none".into()).to_string(), "none");
    }
}
