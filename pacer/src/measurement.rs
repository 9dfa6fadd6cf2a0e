use metrics_util::Summary;
use std::time::Duration;
use tracing::error;

/// Latency distribution of settled attempts.
#[derive(Clone)]
pub(crate) struct LatencyDigest {
    summary: Summary,
}

impl LatencyDigest {
    pub fn new() -> Self {
        Self {
            summary: Summary::with_defaults(),
        }
    }

    pub fn insert(&mut self, latency: Duration) {
        self.summary.add(latency.as_secs_f64());
    }

    pub fn count(&self) -> usize {
        self.summary.count()
    }

    pub fn quantile(&self, quantile: f64) -> Duration {
        let Some(secs) = self.summary.quantile(quantile) else {
            return Duration::ZERO;
        };

        let secs = if secs.is_finite() && secs >= 0. {
            secs
        } else {
            error!("Non-finite latency quantile {quantile}; reporting zero.");
            0.
        };

        Duration::from_secs_f64(secs)
    }
}

impl std::fmt::Debug for LatencyDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatencyDigest")
            .field("count", &self.count())
            .finish()
    }
}
