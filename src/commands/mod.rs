// ABOUTME: Command implementations for each migration verb
// ABOUTME: Exports validate, migrate, and verify commands

pub mod migrate;
pub mod validate;
pub mod verify;

pub use migrate::migrate;
pub use validate::validate;
pub use verify::verify;
