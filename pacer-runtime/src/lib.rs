//! Command line runtime for `pacer`.
pub mod runtime;
pub mod targets;

mod error;
mod logging;

pub use crate::error::RuntimeError;
pub use crate::logging::init_logging;
pub use crate::runtime::{PacerCli, PacerRuntime};
