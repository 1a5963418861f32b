// ABOUTME: Write batching for the destination
// ABOUTME: Queues write operations and executes them in pipelined round trips

use crate::error::RunError;
use crate::store::{DestinationOps, WriteOp};

/// Accumulates destination writes and flushes them as single pipelined
/// round trips.
///
/// The batcher never drops a queued operation: it flushes when the queue
/// reaches the configured threshold and once more, unconditionally, when
/// the run ends. A failed execute loses the whole in-flight batch, which
/// is why [`RunError::BatchExecute`] carries the lost-operation count and
/// callers treat it as fatal instead of retrying.
#[derive(Debug, Default)]
pub struct WriteBatcher {
    ops: Vec<WriteOp>,
}

impl WriteBatcher {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Queue one destination write.
    pub fn enqueue(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    /// Number of queued operations. A stream key contributes one per
    /// entry, so this bounds pipeline size by operations rather than keys.
    pub fn pending(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Flush if the queue has reached `threshold` operations.
    ///
    /// Returns how many operations went out (0 when below threshold).
    pub async fn flush_if_full<D: DestinationOps>(
        &mut self,
        destination: &mut D,
        threshold: usize,
    ) -> Result<usize, RunError> {
        if self.ops.len() >= threshold {
            self.flush(destination).await
        } else {
            Ok(0)
        }
    }

    /// Flush whatever is queued, unconditionally.
    ///
    /// Safe to call with an empty queue; nothing is sent in that case.
    pub async fn flush<D: DestinationOps>(
        &mut self,
        destination: &mut D,
    ) -> Result<usize, RunError> {
        if self.ops.is_empty() {
            return Ok(0);
        }

        let count = self.ops.len();
        match destination.execute_batch(&self.ops).await {
            Ok(()) => {
                self.ops.clear();
                Ok(count)
            }
            Err(source) => Err(RunError::BatchExecute {
                lost: count,
                source,
            }),
        }
    }
}
