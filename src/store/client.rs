// ABOUTME: RedisStore, the production implementation of the source and
// ABOUTME: destination traits over a multiplexed async Redis connection

use crate::error::StoreError;
use crate::store::traits::{DestinationOps, KeyType, SourceOps, StreamEntry, WriteOp};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

/// A live Redis endpoint.
///
/// Wraps a multiplexed connection, so clones are cheap and share one
/// socket. The same type serves as source and destination; which role it
/// plays is decided by which trait the caller goes through.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    pub fn new(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }

    /// Liveness check (`PING`).
    ///
    /// Inherent rather than trait-only so call sites that hold both
    /// traits in scope do not need to disambiguate.
    pub async fn ping(&mut self) -> Result<(), StoreError> {
        let _: String = redis::cmd("PING").query_async(&mut self.connection).await?;
        Ok(())
    }

    /// Number of keys in the selected database (`DBSIZE`).
    pub async fn key_count(&mut self) -> Result<u64, StoreError> {
        let count: u64 = redis::cmd("DBSIZE")
            .query_async(&mut self.connection)
            .await?;
        Ok(count)
    }

    /// Server version from `INFO server`, for endpoint reports.
    pub async fn server_version(&mut self) -> Result<String, StoreError> {
        let info: String = redis::cmd("INFO")
            .arg("server")
            .query_async(&mut self.connection)
            .await?;
        Ok(parse_info_field(&info, "redis_version").unwrap_or_else(|| "unknown".to_string()))
    }
}

impl SourceOps for RedisStore {
    async fn ping(&mut self) -> Result<(), StoreError> {
        RedisStore::ping(self).await
    }

    async fn scan_page(
        &mut self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<Vec<u8>>), StoreError> {
        let reply: (u64, Vec<Vec<u8>>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut self.connection)
            .await?;
        Ok(reply)
    }

    async fn type_of(&mut self, key: &str) -> Result<KeyType, StoreError> {
        let tag: String = redis::cmd("TYPE")
            .arg(key)
            .query_async(&mut self.connection)
            .await?;
        Ok(KeyType::from_wire(&tag))
    }

    async fn get_string(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value: Option<Vec<u8>> = self.connection.get(key).await?;
        Ok(value)
    }

    async fn list_range(
        &mut self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<Vec<u8>>, StoreError> {
        let values: Vec<Vec<u8>> = self.connection.lrange(key, start, stop).await?;
        Ok(values)
    }

    async fn set_members(&mut self, key: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        let members: Vec<Vec<u8>> = self.connection.smembers(key).await?;
        Ok(members)
    }

    async fn hash_fields(&mut self, key: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let fields: Vec<(Vec<u8>, Vec<u8>)> = self.connection.hgetall(key).await?;
        Ok(fields)
    }

    async fn sorted_set_with_scores(
        &mut self,
        key: &str,
    ) -> Result<Vec<(Vec<u8>, f64)>, StoreError> {
        let members: Vec<(Vec<u8>, f64)> = self.connection.zrange_withscores(key, 0, -1).await?;
        Ok(members)
    }

    async fn stream_entries(&mut self, key: &str) -> Result<Vec<StreamEntry>, StoreError> {
        // XRANGE replies nest: [[id, [field, value, ...]], ...]
        let raw: Vec<(String, Vec<(String, Vec<u8>)>)> = redis::cmd("XRANGE")
            .arg(key)
            .arg("-")
            .arg("+")
            .query_async(&mut self.connection)
            .await?;
        Ok(raw
            .into_iter()
            .map(|(id, fields)| StreamEntry { id, fields })
            .collect())
    }

    async fn key_count(&mut self) -> Result<u64, StoreError> {
        RedisStore::key_count(self).await
    }
}

impl DestinationOps for RedisStore {
    async fn ping(&mut self) -> Result<(), StoreError> {
        RedisStore::ping(self).await
    }

    async fn exists(&mut self, key: &str) -> Result<bool, StoreError> {
        let present: bool = self.connection.exists(key).await?;
        Ok(present)
    }

    async fn execute_batch(&mut self, ops: &[WriteOp]) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for op in ops {
            match op {
                WriteOp::Set { key, value } => {
                    pipe.set(key, value).ignore();
                }
                WriteOp::ListAppendAll { key, values } => {
                    pipe.rpush(key, values).ignore();
                }
                WriteOp::SetAddAll { key, members } => {
                    pipe.sadd(key, members).ignore();
                }
                WriteOp::HashSetAll { key, fields } => {
                    pipe.hset_multiple(key, fields).ignore();
                }
                WriteOp::SortedSetAddAll { key, members } => {
                    pipe.zadd_multiple(key, members).ignore();
                }
                WriteOp::StreamAppend { key, id, fields } => {
                    pipe.xadd(key, id, fields).ignore();
                }
            }
        }

        let _: () = pipe.query_async(&mut self.connection).await?;
        Ok(())
    }

    async fn key_count(&mut self) -> Result<u64, StoreError> {
        RedisStore::key_count(self).await
    }
}

fn parse_info_field(info: &str, field: &str) -> Option<String> {
    let prefix = format!("{}:", field);
    info.lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .map(|value| value.trim().to_string())
}
