// ABOUTME: Key-value store layer module
// ABOUTME: Exports connection management, the Redis-backed store, and the traits

pub mod client;
pub mod connection;
pub mod traits;

pub use client::RedisStore;
pub use connection::{connect, connect_with_retry};
pub use traits::{DestinationOps, KeyType, SourceOps, StreamEntry, WriteOp};
