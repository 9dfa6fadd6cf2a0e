//! The unit of work driven by the scheduler.
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// Why an operation failed. Only the message survives; the scheduler never inspects the original
/// error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct OperationError(String);

impl OperationError {
    pub fn new(reason: impl fmt::Display) -> Self {
        Self(reason.to_string())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// Terminal state of a single attempt. Produced exactly once per submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(OperationError),
    TimedOut,
}

impl From<Result<(), OperationError>> for Outcome {
    fn from(res: Result<(), OperationError>) -> Self {
        match res {
            Ok(()) => Outcome::Succeeded,
            Err(err) => Outcome::Failed(err),
        }
    }
}

/// Capability driven by the scheduler: execute one operation, report success or failure.
///
/// Implementations own their backend resources (connection pools, clients, sessions) and must
/// tolerate `tps * 2` concurrent calls to [`Operation::execute`]. The scheduler's batch timeout is
/// authoritative for classification; an implementation may still apply its own, shorter timeout.
///
/// Any closure returning a future of `Result<R, E>` with a displayable error is an `Operation`:
///
/// ```no_run
/// use pacer::{RunConfig, Scheduler};
///
/// # async fn example() {
/// let config = RunConfig::new(10, 3, 1.).unwrap();
/// let report = Scheduler::new(config, || async {
///     tokio::time::sleep(std::time::Duration::from_millis(5)).await;
///     Ok::<_, std::io::Error>(())
/// })
/// .run()
/// .await;
/// # }
/// ```
pub trait Operation: Send + Sync + 'static {
    fn execute(&self) -> impl Future<Output = Result<(), OperationError>> + Send;

    /// Release backend resources. Called once after the final batch, before reporting.
    fn shutdown(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

impl<T, F, R, E> Operation for T
where
    T: Fn() -> F + Send + Sync + 'static,
    F: Future<Output = Result<R, E>> + Send,
    E: fmt::Display,
{
    fn execute(&self) -> impl Future<Output = Result<(), OperationError>> + Send {
        let fut = self();
        async move { fut.await.map(|_| ()).map_err(OperationError::new) }
    }
}
