// ABOUTME: Per-key failure log for migration runs
// ABOUTME: Truncates its file on open and records one timestamped entry per failed key

use crate::utils::sanitize_key;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File-backed log of per-key failures.
///
/// Opened in truncate mode so every run starts with a clean log; the
/// end-of-run summary points operators here whenever the failed count is
/// nonzero. One bracketed entry per failed key, tagged with the failure
/// stage and the underlying cause.
pub struct ErrorLog {
    writer: BufWriter<File>,
    path: PathBuf,
    entries: u64,
}

impl ErrorLog {
    /// Create the log file at `path`, truncating any previous run's log.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            entries: 0,
        })
    }

    /// Record one per-key failure.
    ///
    /// The entry is on disk when this returns; a crash later in the run
    /// cannot swallow already-recorded failures.
    pub fn record(
        &mut self,
        key: &str,
        stage: &str,
        cause: impl std::fmt::Display,
    ) -> std::io::Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(
            self.writer,
            "[{} - ERROR - {} failed for key |{}|: {}]",
            timestamp,
            stage,
            sanitize_key(key),
            cause
        )?;
        self.writer.flush()?;
        self.entries += 1;
        Ok(())
    }

    /// Number of entries recorded so far.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Where the log lives, for the end-of-run pointer.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
