// ABOUTME: Migration core module
// ABOUTME: Exports the keyspace scanner, copier, write batcher, runner, and error log

pub mod batch;
pub mod copier;
pub mod error_log;
pub mod runner;
pub mod scanner;

pub use batch::WriteBatcher;
pub use copier::copy_key;
pub use error_log::ErrorLog;
pub use runner::{MigrationReport, Migrator, RunCounters};
pub use scanner::KeyspaceScanner;
