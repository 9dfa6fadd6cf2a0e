//! Run-wide counters shared between the scheduler and any observers.
use crate::measurement::LatencyDigest;
use crate::operation::Outcome;
#[cfg(feature = "metrics")]
use pacer_core::OperationLabels;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Consistent view of the counters at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMetrics {
    pub total_attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Subset of `failed`.
    pub timed_out: u64,
    pub latency_p50: Duration,
    pub latency_p90: Duration,
    pub latency_p99: Duration,
}

impl RunMetrics {
    pub fn settled(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Counters for a single run behind one lock, so that `succeeded + failed <= total_attempted`
/// holds at every observation once in-flight batches have settled.
///
/// Cloning yields another handle onto the same counters.
#[derive(Clone)]
pub struct MetricsAggregator {
    inner: Arc<Mutex<Counters>>,
    #[cfg(feature = "metrics")]
    labels: Arc<OperationLabels>,
}

#[derive(Debug)]
struct Counters {
    total_attempted: u64,
    succeeded: u64,
    failed: u64,
    timed_out: u64,
    latency: LatencyDigest,
}

impl MetricsAggregator {
    #[allow(unused_variables)]
    pub fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Counters {
                total_attempted: 0,
                succeeded: 0,
                failed: 0,
                timed_out: 0,
                latency: LatencyDigest::new(),
            })),
            #[cfg(feature = "metrics")]
            labels: Arc::new(OperationLabels::new(name)),
        }
    }

    /// Record a terminal outcome. `latency` is ignored for timeouts.
    pub fn record(&self, outcome: &Outcome, latency: Duration) {
        match outcome {
            Outcome::Succeeded => self.record_success(latency),
            Outcome::Failed(_) => self.record_failure(latency),
            Outcome::TimedOut => self.record_timeout(),
        }
    }

    pub fn record_success(&self, latency: Duration) {
        {
            let mut counters = self.lock();
            counters.succeeded += 1;
            counters.latency.insert(latency);
        }

        #[cfg(feature = "metrics")]
        {
            metrics::counter!(self.labels.success.clone()).increment(1);
            metrics::histogram!(self.labels.latency.clone()).record(latency.as_secs_f64());
        }
    }

    pub fn record_failure(&self, latency: Duration) {
        {
            let mut counters = self.lock();
            counters.failed += 1;
            counters.latency.insert(latency);
        }

        #[cfg(feature = "metrics")]
        {
            metrics::counter!(self.labels.error.clone()).increment(1);
            metrics::histogram!(self.labels.latency.clone()).record(latency.as_secs_f64());
        }
    }

    /// A timeout counts as a failure. It has no latency sample since the attempt never settled.
    pub fn record_timeout(&self) {
        {
            let mut counters = self.lock();
            counters.failed += 1;
            counters.timed_out += 1;
        }

        #[cfg(feature = "metrics")]
        {
            metrics::counter!(self.labels.error.clone()).increment(1);
            metrics::counter!(self.labels.timeout.clone()).increment(1);
        }
    }

    pub fn record_attempted(&self, n: u64) {
        self.lock().total_attempted += n;
    }

    pub fn snapshot(&self) -> RunMetrics {
        let counters = self.lock();
        RunMetrics {
            total_attempted: counters.total_attempted,
            succeeded: counters.succeeded,
            failed: counters.failed,
            timed_out: counters.timed_out,
            latency_p50: counters.latency.quantile(0.5),
            latency_p90: counters.latency.quantile(0.9),
            latency_p99: counters.latency.quantile(0.99),
        }
    }

    // Counters are plain integers; a panic mid-update cannot leave them torn.
    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
