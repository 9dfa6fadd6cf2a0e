//! Turning final counters into a [`RunReport`] and handing it to a sink.
use crate::aggregator::RunMetrics;
use pacer_core::RunReport;
use std::io::{self, Write};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),

    #[cfg(feature = "json")]
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination of the final report.
pub trait ReportSink: Send {
    fn emit(&mut self, report: &RunReport) -> Result<(), SinkError>;
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn emit(&mut self, report: &RunReport) -> Result<(), SinkError> {
        (**self).emit(report)
    }
}

/// Logs each line of the report at `INFO`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn emit(&mut self, report: &RunReport) -> Result<(), SinkError> {
        for line in report.lines() {
            info!("{line}");
        }
        Ok(())
    }
}

/// Writes the human-readable report to any writer, flushing afterwards.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ReportSink for WriterSink<W> {
    fn emit(&mut self, report: &RunReport) -> Result<(), SinkError> {
        write!(self.writer, "{report}")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes the report as a single JSON document.
#[cfg(feature = "json")]
#[derive(Debug)]
pub struct JsonSink<W> {
    writer: W,
}

#[cfg(feature = "json")]
impl<W: Write + Send> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(feature = "json")]
impl<W: Write + Send> ReportSink for JsonSink<W> {
    fn emit(&mut self, report: &RunReport) -> Result<(), SinkError> {
        serde_json::to_writer_pretty(&mut self.writer, report)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Discards the report; the caller only wants the returned value.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn emit(&mut self, _report: &RunReport) -> Result<(), SinkError> {
        Ok(())
    }
}

pub struct Reporter {
    sink: Box<dyn ReportSink>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(TracingSink)
    }
}

impl Reporter {
    pub fn new(sink: impl ReportSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }

    /// Build the report and emit it. A failing sink is logged; the report is returned either way.
    pub fn report(
        &mut self,
        name: &str,
        metrics: &RunMetrics,
        duration: NonZeroU32,
        elapsed: Duration,
    ) -> RunReport {
        let report = build_report(name, metrics, duration, elapsed);
        if let Err(err) = self.sink.emit(&report) {
            error!("Unable to emit report: {err}");
        }
        report
    }
}

/// Throughput is offered load over the configured duration, independent of how long the run
/// actually took.
pub fn build_report(
    name: &str,
    metrics: &RunMetrics,
    duration: NonZeroU32,
    elapsed: Duration,
) -> RunReport {
    let throughput = metrics.total_attempted as f64 / f64::from(duration.get());
    let goodput = if elapsed.is_zero() {
        0.
    } else {
        metrics.succeeded as f64 / elapsed.as_secs_f64()
    };

    RunReport {
        name: name.to_string(),
        total_attempted: metrics.total_attempted,
        succeeded: metrics.succeeded,
        failed: metrics.failed,
        timed_out: metrics.timed_out,
        throughput,
        goodput,
        elapsed,
        latency_p50: metrics.latency_p50,
        latency_p90: metrics.latency_p90,
        latency_p99: metrics.latency_p99,
    }
}
