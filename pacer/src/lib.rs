#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod aggregator;
mod measurement;
mod operation;
pub mod pool;
mod reporter;
mod scheduler;
mod timer;

pub use aggregator::{MetricsAggregator, RunMetrics};
pub use operation::{Operation, OperationError, Outcome};
#[cfg(feature = "json")]
pub use reporter::JsonSink;
pub use reporter::{
    build_report, NullSink, ReportSink, Reporter, SinkError, TracingSink, WriterSink,
};
pub use scheduler::Scheduler;

pub use pacer_core as core;
pub use pacer_core::{ConfigError, RunConfig, RunReport};

pub mod prelude {
    pub use crate::operation::{Operation, OperationError};
    pub use crate::scheduler::Scheduler;
    pub use pacer_core::{RunConfig, RunReport};
}
