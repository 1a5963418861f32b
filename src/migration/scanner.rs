// ABOUTME: Cursor-based keyspace scanner over the source instance
// ABOUTME: Yields keys lazily, one SCAN page at a time, until the cursor wraps to zero

use crate::error::StoreError;
use crate::store::SourceOps;
use std::collections::VecDeque;

/// Lazy iteration over the source keyspace via `SCAN`.
///
/// The scanner owns the cursor and an internal page buffer; callers pull
/// one key at a time so pacing decisions (pauses, flushes, aborts) stay
/// with the caller. The cursor lives only as long as this value; there
/// is no way to resume a scan across process runs.
///
/// SCAN guarantees are inherited as-is: keys present for the whole scan
/// are seen at least once, but keys written concurrently may be missed
/// and long scans are not a point-in-time snapshot.
pub struct KeyspaceScanner {
    pattern: String,
    page_size: usize,
    cursor: u64,
    buffer: VecDeque<Vec<u8>>,
    exhausted: bool,
}

impl KeyspaceScanner {
    /// A scanner for keys matching `pattern`, fetching pages of roughly
    /// `page_size` keys (COUNT is a hint, not a promise).
    pub fn new(pattern: &str, page_size: usize) -> Self {
        Self {
            pattern: pattern.to_string(),
            page_size,
            cursor: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// The next key, fetching further pages as needed.
    ///
    /// Returns `Ok(None)` once the server has completed the scan. Pages
    /// may legitimately be empty while the cursor is still live, so this
    /// keeps fetching until it has a key or the cursor wraps to zero.
    pub async fn next_key<S: SourceOps>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        loop {
            if let Some(key) = self.buffer.pop_front() {
                return Ok(Some(key));
            }
            if self.exhausted {
                return Ok(None);
            }

            // The first page runs with cursor 0; the scan is only complete
            // when a later reply wraps the cursor back to 0.
            let (next_cursor, keys) = source
                .scan_page(self.cursor, &self.pattern, self.page_size)
                .await?;
            self.cursor = next_cursor;
            if next_cursor == 0 {
                self.exhausted = true;
            }
            self.buffer.extend(keys);
        }
    }
}
