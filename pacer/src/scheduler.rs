//! The batch scheduling loop.
use crate::aggregator::MetricsAggregator;
use crate::operation::{Operation, Outcome};
use crate::pool::{AttemptHandle, BatchId, Settlement, WorkerPool};
use crate::reporter::{ReportSink, Reporter};
use crate::timer::Timer;
use pacer_core::{RunConfig, RunReport, TICK};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

// Deadline for timeouts too large to add to an `Instant`. Roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Drives an [`Operation`] at a fixed rate for a fixed number of one-second batches.
///
/// Each batch submits `tps` attempts, waits up to `timeout` for them to settle, counts every
/// attempt still pending at the deadline as a failure and cancels it, then sleeps out the rest
/// of its second. Failures never stop the run.
///
/// # Example
/// ```no_run
/// use pacer::{RunConfig, Scheduler};
///
/// #[tokio::main]
/// async fn main() {
///     let config = RunConfig::new(5, 3, 1.).unwrap();
///     let report = Scheduler::new(config, my_operation).run().await;
///     assert_eq!(report.total_attempted, 15);
/// }
///
/// async fn my_operation() -> Result<(), std::io::Error> {
///     Ok(())
/// }
/// ```
pub struct Scheduler<O> {
    config: RunConfig,
    operation: Arc<O>,
    aggregator: MetricsAggregator,
    reporter: Reporter,
}

struct Batch {
    id: BatchId,
    started: Instant,
    deadline: Instant,
    handles: Vec<AttemptHandle>,
}

impl<O: Operation> Scheduler<O> {
    pub fn new(config: RunConfig, operation: O) -> Self {
        let aggregator = MetricsAggregator::new(config.name());
        Self {
            config,
            operation: Arc::new(operation),
            aggregator,
            reporter: Reporter::default(),
        }
    }

    /// Replace the default [`TracingSink`](crate::TracingSink).
    pub fn with_sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.reporter = Reporter::new(sink);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Handle onto the live counters, e.g. for progress output while the run is in flight.
    pub fn metrics(&self) -> MetricsAggregator {
        self.aggregator.clone()
    }

    #[instrument(name = "run", skip_all, fields(name = self.config.name()))]
    pub async fn run(mut self) -> RunReport {
        info!(
            "Running {} at {} TPS for {} batches ({} attempts) with a {:?} timeout",
            self.config.name(),
            self.config.tps(),
            self.config.duration(),
            self.config.total_offered(),
            self.config.timeout()
        );

        let start = Instant::now();
        let mut pool = WorkerPool::new(self.config.pool_capacity());
        let mut timer = Timer::new(TICK).await;
        debug!("Batch slot length {timer}, pool capacity {}", pool.capacity());

        for index in 0..BatchId::from(self.config.duration().get()) {
            let Batch {
                id,
                started,
                deadline,
                handles,
            } = self.submit_batch(&pool, index);

            let settlement = pool.await_all(handles, deadline).await;
            if !settlement.pending.is_empty() {
                debug!(
                    "Batch {id} deadline reached with {} of {} workers busy",
                    pool.busy(),
                    pool.capacity()
                );
            }
            self.classify(id, &settlement);
            pool.close(id, &settlement.pending);
            self.aggregator
                .record_attempted(u64::from(self.config.tps().get()));

            let busy = started.elapsed();
            if busy >= TICK {
                warn!("Batch {id} took {busy:?}, overrunning its slot. The run will drift.");
            }
            timer.tick().await;
        }

        pool.shutdown();
        self.operation.shutdown().await;

        let elapsed = start.elapsed();
        info!("Run complete in {elapsed:?}");

        let metrics = self.aggregator.snapshot();
        self.reporter.report(
            self.config.name(),
            &metrics,
            self.config.duration(),
            elapsed,
        )
    }

    fn submit_batch(&self, pool: &WorkerPool, id: BatchId) -> Batch {
        let started = Instant::now();
        let handles = (0..self.config.tps().get() as usize)
            .map(|attempt| pool.submit(id, attempt, self.operation.clone()))
            .collect();

        Batch {
            id,
            started,
            deadline: started
                .checked_add(self.config.timeout())
                .unwrap_or_else(|| started + FAR_FUTURE),
            handles,
        }
    }

    fn classify(&self, id: BatchId, settlement: &Settlement) {
        let settled = settlement
            .settled
            .iter()
            .map(|settled| (settled.attempt, settled.latency, settled.outcome()));
        let pending = settlement
            .pending
            .iter()
            .map(|handle| (handle.attempt(), self.config.timeout(), Outcome::TimedOut));

        let (mut succeeded, mut failed, mut timed_out) = (0, 0, 0);
        for (attempt, latency, outcome) in settled.chain(pending) {
            match &outcome {
                Outcome::Succeeded => succeeded += 1,
                Outcome::Failed(err) => {
                    failed += 1;
                    debug!("Attempt {attempt} of batch {id} failed: {err}");
                }
                Outcome::TimedOut => {
                    timed_out += 1;
                    debug!("Attempt {attempt} of batch {id} timed out after {latency:?}");
                }
            }
            self.aggregator.record(&outcome, latency);
        }

        debug!("Batch {id}: {succeeded} succeeded, {failed} failed, {timed_out} timed out");
    }
}
