#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
#[cfg(feature = "serde")]
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::fmt;
use std::time::Duration;

/// Final statistics of a run, computed once after the last batch has settled.
///
/// `throughput` is the offered load averaged over the configured duration; the measured rate of
/// successful operations over actual wall-clock time is `goodput`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", cfg_eval::cfg_eval, serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunReport {
    pub name: String,
    pub total_attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Subset of `failed` that did not settle before the batch deadline.
    pub timed_out: u64,
    pub throughput: f64,
    pub goodput: f64,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationSecondsWithFrac<f64>"))]
    pub elapsed: Duration,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationSecondsWithFrac<f64>"))]
    pub latency_p50: Duration,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationSecondsWithFrac<f64>"))]
    pub latency_p90: Duration,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationSecondsWithFrac<f64>"))]
    pub latency_p99: Duration,
}

impl RunReport {
    pub fn error_rate(&self) -> f64 {
        if self.total_attempted == 0 {
            0.
        } else {
            self.failed as f64 / self.total_attempted as f64
        }
    }

    /// Human readable summary, one entry per line.
    pub fn lines(&self) -> Vec<String> {
        vec![
            "=== Test Results ===".to_string(),
            format!("Run: {}", self.name),
            format!("Total operations: {}", self.total_attempted),
            format!("Successful operations: {}", self.succeeded),
            format!("Failed operations: {}", self.failed),
            format!("Timed out operations: {}", self.timed_out),
            format!("Error rate: {:.1}%", self.error_rate() * 100.),
            format!("QPS: {:.2}", self.throughput),
            format!("Goodput: {:.2}", self.goodput),
            format!("Elapsed: {}", humantime::format_duration(round_ms(self.elapsed))),
            format!(
                "Latency: p50={:?}, p90={:?}, p99={:?}",
                self.latency_p50, self.latency_p90, self.latency_p99
            ),
        ]
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

fn round_ms(dur: Duration) -> Duration {
    Duration::from_millis(dur.as_millis() as u64)
}
