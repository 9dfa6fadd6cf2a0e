use crate::{DEFAULT_RUN_NAME, POOL_HEADROOM};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

/// Rejected run parameters. Values are never clamped into range.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("tps must be at least 1")]
    ZeroTps,

    #[error("duration must be at least 1 second")]
    ZeroDuration,

    #[error("timeout must be a positive, finite number of seconds (got {0})")]
    InvalidTimeout(f64),
}

/// Immutable parameters of a single run.
///
/// Only obtainable through [`RunConfig::new`], so every instance satisfies `tps >= 1`,
/// `duration >= 1` and `timeout > 0`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "serde_impl::RawRunConfig", into = "serde_impl::RawRunConfig")
)]
pub struct RunConfig {
    name: String,
    tps: NonZeroU32,
    duration: NonZeroU32,
    timeout: Duration,
}

impl RunConfig {
    /// Validate and build a run configuration.
    ///
    /// * `tps` - operations submitted per one-second batch
    /// * `duration` - number of batches (seconds) to run
    /// * `timeout_secs` - how long each batch may take to settle
    pub fn new(tps: u32, duration: u32, timeout_secs: f64) -> Result<Self, ConfigError> {
        let tps = NonZeroU32::new(tps).ok_or(ConfigError::ZeroTps)?;
        let duration = NonZeroU32::new(duration).ok_or(ConfigError::ZeroDuration)?;
        if !(timeout_secs.is_finite() && timeout_secs > 0.) {
            return Err(ConfigError::InvalidTimeout(timeout_secs));
        }
        let timeout = Duration::try_from_secs_f64(timeout_secs)
            .map_err(|_| ConfigError::InvalidTimeout(timeout_secs))?;
        // Sub-nanosecond inputs round down to zero.
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(timeout_secs));
        }

        Ok(Self {
            name: DEFAULT_RUN_NAME.to_string(),
            tps,
            duration,
            timeout,
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tps(&self) -> NonZeroU32 {
        self.tps
    }

    /// Number of one-second batches in the run.
    pub fn duration(&self) -> NonZeroU32 {
        self.duration
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn pool_capacity(&self) -> usize {
        self.tps.get() as usize * POOL_HEADROOM
    }

    /// Offered load over the whole run.
    pub fn total_offered(&self) -> u64 {
        u64::from(self.tps.get()) * u64::from(self.duration.get())
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;

    #[derive(Serialize, Deserialize)]
    pub(super) struct RawRunConfig {
        #[serde(default = "default_name")]
        name: String,
        tps: u32,
        duration: u32,
        timeout: f64,
    }

    fn default_name() -> String {
        DEFAULT_RUN_NAME.to_string()
    }

    impl TryFrom<RawRunConfig> for RunConfig {
        type Error = ConfigError;

        fn try_from(raw: RawRunConfig) -> Result<Self, Self::Error> {
            Ok(RunConfig::new(raw.tps, raw.duration, raw.timeout)?.with_name(&raw.name))
        }
    }

    impl From<RunConfig> for RawRunConfig {
        fn from(config: RunConfig) -> Self {
            Self {
                name: config.name,
                tps: config.tps.get(),
                duration: config.duration.get(),
                timeout: config.timeout.as_secs_f64(),
            }
        }
    }
}
