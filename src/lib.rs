// ABOUTME: Library module for redis-keys-migrator
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod error;
pub mod migration;
pub mod store;
pub mod utils;
