use metrics_exporter_prometheus::BuildError;
use pacer::ConfigError;
use thiserror::Error;
use tracing_appender::rolling::InitError;
use tracing_subscriber::util::TryInitError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failure rate must be within [0, 1] (got {0})")]
    FailureRate(f64),

    #[error("Unable to open log file: {0}")]
    LogFile(#[from] InitError),

    #[error("Logging is already initialised: {0}")]
    Logging(#[from] TryInitError),

    #[error("Unable to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Unable to install metrics exporter: {0}")]
    MetricsExporter(#[from] BuildError),
}
