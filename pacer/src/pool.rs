//! Bounded-concurrency executor for operation attempts.
//!
//! Every attempt is tagged with the batch that submitted it. Completions flow back over a single
//! channel and are matched against the batch currently being awaited; anything belonging to a
//! batch that has already been closed is dropped, so a cancelled attempt that runs to completion
//! anyway can never be attributed twice.
use crate::operation::{Operation, OperationError, Outcome};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{trace, Instrument};

pub type BatchId = u64;

/// Handle onto a submitted attempt.
#[derive(Debug)]
pub struct AttemptHandle {
    batch: BatchId,
    attempt: usize,
    abort: AbortHandle,
}

impl AttemptHandle {
    pub fn batch(&self) -> BatchId {
        self.batch
    }

    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Best-effort cancellation. Takes effect at the attempt's next await point; an operation
    /// blocked outside the async runtime keeps running and its result is discarded.
    pub fn cancel(&self) {
        self.abort.abort();
    }
}

/// An attempt that reached a terminal state before the deadline.
#[derive(Debug)]
pub struct Settled {
    pub attempt: usize,
    pub latency: Duration,
    pub result: Result<(), OperationError>,
}

impl Settled {
    pub fn outcome(&self) -> Outcome {
        self.result.clone().into()
    }
}

/// Attempts of one batch, split at the deadline.
#[derive(Debug, Default)]
pub struct Settlement {
    pub settled: Vec<Settled>,
    pub pending: Vec<AttemptHandle>,
}

#[derive(Debug)]
struct Completion {
    batch: BatchId,
    attempt: usize,
    latency: Duration,
    result: Result<(), OperationError>,
}

pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
    // Batches with an id below this value are closed.
    closed_below: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl WorkerPool {
    /// NOTE: Panics when capacity=0
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Worker pool capacity must be non-zero.");
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            closed_below: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of attempts currently executing.
    pub fn busy(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Submit one attempt. Never blocks: when every worker is busy the attempt waits for a free
    /// slot, and is skipped entirely if its batch closes first.
    pub fn submit<O: Operation>(
        &self,
        batch: BatchId,
        attempt: usize,
        operation: Arc<O>,
    ) -> AttemptHandle {
        let permits = self.permits.clone();
        let closed_below = self.closed_below.clone();
        let tx = self.tx.clone();

        let task = tokio::spawn(
            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    trace!("Pool shut down before attempt {attempt} of batch {batch} started.");
                    return;
                };

                if batch < closed_below.load(Ordering::Acquire) {
                    trace!("Batch {batch} closed before attempt {attempt} started.");
                    return;
                }

                let start = Instant::now();
                let result = operation.execute().await;
                let latency = start.elapsed();

                // The receiver is gone once the pool has been shut down.
                let _ = tx.send(Completion {
                    batch,
                    attempt,
                    latency,
                    result,
                });
            }
            .in_current_span(),
        );

        AttemptHandle {
            batch,
            attempt,
            abort: task.abort_handle(),
        }
    }

    /// Wait for the given attempts to settle, returning early at `deadline`.
    ///
    /// Completions from other batches arriving in the meantime are discarded.
    pub async fn await_all(
        &mut self,
        handles: Vec<AttemptHandle>,
        deadline: Instant,
    ) -> Settlement {
        let mut pending: HashMap<(BatchId, usize), AttemptHandle> = handles
            .into_iter()
            .map(|handle| ((handle.batch, handle.attempt), handle))
            .collect();
        let mut settled = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let completion = match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(completion)) => completion,
                // Deadline reached. The channel cannot close while `self.tx` is alive.
                Ok(None) | Err(_) => break,
            };

            if pending
                .remove(&(completion.batch, completion.attempt))
                .is_some()
            {
                settled.push(Settled {
                    attempt: completion.attempt,
                    latency: completion.latency,
                    result: completion.result,
                });
            } else {
                trace!(
                    "Dropping late completion of attempt {} from closed batch {}.",
                    completion.attempt,
                    completion.batch
                );
            }
        }

        let mut pending: Vec<_> = pending.into_values().collect();
        pending.sort_by_key(|handle| handle.attempt);

        Settlement { settled, pending }
    }

    /// Close a batch and cancel whatever it still has running. Any result the cancelled attempts
    /// produce afterwards is ignored.
    pub fn close(&self, batch: BatchId, pending: &[AttemptHandle]) {
        self.closed_below.fetch_max(batch + 1, Ordering::AcqRel);
        for handle in pending {
            debug_assert_eq!(handle.batch(), batch);
            handle.cancel();
        }
    }

    /// Stop admitting work. Attempts still waiting for a slot exit without running.
    pub fn shutdown(self) {
        self.closed_below.store(BatchId::MAX, Ordering::Release);
        self.permits.close();
    }
}
