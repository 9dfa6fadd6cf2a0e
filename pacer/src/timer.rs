use std::time::Duration;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};

/// Keeps batches aligned to fixed wall-clock slots.
///
/// When a batch overruns its slot the next one starts immediately and the schedule shifts;
/// missed slots are never caught up.
pub(crate) struct Timer {
    interval: Interval,
    last_tick: Instant,
    interval_dur: Duration,
}

impl Timer {
    pub async fn new(interval_dur: Duration) -> Self {
        let mut interval = interval(interval_dur);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // NOTE: First tick completes instantly
        let last_tick = interval.tick().await;
        Self {
            interval,
            last_tick,
            interval_dur,
        }
    }

    /// Sleep out the remainder of the current slot. Returns how long the slot actually lasted.
    pub async fn tick(&mut self) -> Duration {
        self.interval.tick().await;
        // `Interval` reports the scheduled instant, which lags behind after an overrun.
        let now = Instant::now();
        let elapsed = now - self.last_tick;
        self.last_tick = now;
        elapsed
    }
}

impl std::fmt::Display for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", humantime::format_duration(self.interval_dur))
    }
}
