use crate::error::RuntimeError;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "pacer=info,pacer_runtime=info";
const LOG_FILE_PREFIX: &str = "pacer";
const LOG_FILE_SUFFIX: &str = "log";

/// Console logging, plus a daily-rotated file under `log_dir` when given.
///
/// File writes go through a background worker. The returned guard flushes it on drop, so hold
/// it until the run is over. `RUST_LOG` overrides the default filter.
pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, RuntimeError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(dir)?);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// `pacer.YYYY-MM-DD.log` in `dir`, rolled over at midnight UTC.
fn file_appender(dir: &Path) -> Result<RollingFileAppender, RuntimeError> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(dir)?;
    Ok(appender)
}
