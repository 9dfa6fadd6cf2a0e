use std::time::Duration;

/// Length of one scheduling tick. Each batch is paced to start on this boundary.
pub const TICK: Duration = Duration::from_secs(1);

/// The worker pool is sized to this multiple of the per-second submission rate, so stragglers
/// from one batch do not starve the submissions of the next.
pub const POOL_HEADROOM: usize = 2;

/// Default run name used for spans and metric labels.
pub const DEFAULT_RUN_NAME: &str = "pacer";
