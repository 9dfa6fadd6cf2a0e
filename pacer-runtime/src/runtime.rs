//! Command line runtime.
//!
//! Parses the run parameters (flags or `TPS` / `DURATION` / `TIMEOUT` environment variables),
//! picks an operation provider and reports the result to the console or as JSON.
use crate::error::RuntimeError;
use crate::targets::{HttpOperation, SyntheticOperation};
use clap::{Args, Parser, Subcommand, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use pacer::core::DEFAULT_RUN_NAME;
use pacer::{JsonSink, Operation, ReportSink, RunConfig, RunReport, Scheduler, TracingSink};
use reqwest::{Method, Url};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument};

const DEFAULT_TPS: u32 = 10;
const DEFAULT_DURATION: u32 = 3;
const DEFAULT_TIMEOUT: f64 = 10.;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Drive an operation at a fixed rate and report what it sustained.")]
pub struct PacerCli {
    /// Operations submitted per second.
    #[arg(long, env = "TPS", default_value_t = DEFAULT_TPS)]
    pub tps: u32,

    /// Number of one-second batches to run.
    #[arg(long, env = "DURATION", default_value_t = DEFAULT_DURATION)]
    pub duration: u32,

    /// Seconds each batch may take to settle.
    #[arg(long, env = "TIMEOUT", default_value_t = DEFAULT_TIMEOUT)]
    pub timeout: f64,

    /// Label for logs and metrics.
    #[arg(long, default_value = DEFAULT_RUN_NAME)]
    pub name: String,

    /// Also append logs to a dated file in this directory.
    #[arg(long, env = "PACER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Serve Prometheus metrics on this address while running.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,

    #[arg(long, value_enum, default_value_t = Output::Text)]
    pub output: Output,

    #[command(subcommand)]
    pub target: Target,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Report through the log.
    Text,
    /// Print the report to stdout as JSON.
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Target {
    /// One HTTP request per operation.
    Http(HttpArgs),
    /// Sleep, then fail with a fixed probability.
    Synthetic(SyntheticArgs),
}

#[derive(Args, Debug, Clone)]
pub struct HttpArgs {
    #[arg(long)]
    pub url: Url,

    #[arg(long, value_enum, default_value_t = HttpMethod::Get)]
    pub method: HttpMethod,

    /// Request body, sent as-is.
    #[arg(long)]
    pub body: Option<String>,

    /// Add a random query parameter to every request.
    #[arg(long)]
    pub cache_bust: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SyntheticArgs {
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,

    #[arg(long, default_value_t = 0.)]
    pub failure_rate: f64,
}

/// Runs a single load test described by [`PacerCli`].
///
/// # Example
///
/// ```no_run
/// use pacer_runtime::PacerRuntime;
///
/// #[tokio::main]
/// async fn main() {
///     let report = PacerRuntime::with_args().run().await.unwrap();
///     assert_eq!(report.succeeded + report.failed, report.total_attempted);
/// }
/// ```
pub struct PacerRuntime {
    cli: PacerCli,
}

impl PacerRuntime {
    pub fn new(cli: PacerCli) -> Self {
        Self { cli }
    }

    /// Parse the process arguments. Exits with usage on error.
    pub fn with_args() -> Self {
        Self::new(PacerCli::parse())
    }

    pub fn cli(&self) -> &PacerCli {
        &self.cli
    }

    #[instrument(name = "pacer", skip_all, fields(name = self.cli.name))]
    pub async fn run(self) -> Result<RunReport, RuntimeError> {
        let cli = self.cli;
        let config = RunConfig::new(cli.tps, cli.duration, cli.timeout)?.with_name(&cli.name);

        if let Some(addr) = cli.metrics_addr {
            PrometheusBuilder::new().with_http_listener(addr).install()?;
            info!("Serving metrics on {addr}");
        }

        let sink: Box<dyn ReportSink> = match cli.output {
            Output::Text => Box::new(TracingSink),
            Output::Json => Box::new(JsonSink::new(std::io::stdout())),
        };

        let report = match cli.target {
            Target::Http(args) => {
                debug!("HTTP target: {} {}", Method::from(args.method), args.url);
                let operation =
                    HttpOperation::new(args.method.into(), args.url, config.pool_capacity())?
                        .body(args.body)
                        .cache_bust(args.cache_bust);
                drive(config, operation, sink).await
            }
            Target::Synthetic(args) => {
                let operation = SyntheticOperation::new(
                    Duration::from_millis(args.latency_ms),
                    args.failure_rate,
                )?;
                drive(config, operation, sink).await
            }
        };

        Ok(report)
    }
}

async fn drive<O: Operation>(
    config: RunConfig,
    operation: O,
    sink: Box<dyn ReportSink>,
) -> RunReport {
    Scheduler::new(config, operation).with_sink(sink).run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> PacerCli {
        PacerCli::try_parse_from(std::iter::once("pacer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["synthetic"]);
        assert_eq!(cli.tps, DEFAULT_TPS);
        assert_eq!(cli.duration, DEFAULT_DURATION);
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT);
        assert_eq!(cli.name, DEFAULT_RUN_NAME);
        assert_eq!(cli.output, Output::Text);
        assert!(matches!(
            cli.target,
            Target::Synthetic(SyntheticArgs {
                latency_ms: 0,
                ..
            })
        ));
    }

    #[test]
    fn http_target() {
        let cli = parse(&[
            "--tps",
            "50",
            "--timeout",
            "0.5",
            "--output",
            "json",
            "http",
            "--url",
            "http://127.0.0.1:3002/delay/ms/1",
            "--method",
            "post",
            "--cache-bust",
        ]);
        assert_eq!(cli.tps, 50);
        assert_eq!(cli.timeout, 0.5);
        assert_eq!(cli.output, Output::Json);
        let Target::Http(args) = cli.target else {
            panic!("expected http target");
        };
        assert_eq!(args.url.path(), "/delay/ms/1");
        assert_eq!(Method::from(args.method), Method::POST);
        assert!(args.cache_bust);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let res = PacerCli::try_parse_from(["pacer", "http", "--url", "not a url"]);
        assert!(res.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_tps_fails_before_running() {
        let cli = parse(&["--tps", "0", "synthetic"]);
        let res = PacerRuntime::new(cli).run().await;
        assert!(matches!(res, Err(RuntimeError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn synthetic_run() {
        let cli = parse(&[
            "--tps",
            "4",
            "--duration",
            "2",
            "synthetic",
            "--latency-ms",
            "5",
            "--failure-rate",
            "1",
        ]);
        let report = PacerRuntime::new(cli).run().await.unwrap();
        assert_eq!(report.total_attempted, 8);
        assert_eq!(report.failed, 8);
        assert_eq!(report.throughput, 4.);
    }
}
