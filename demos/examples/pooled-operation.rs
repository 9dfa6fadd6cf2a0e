//! An operation that owns a bounded pool of backend sessions and releases them after the run.
use pacer::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

struct SessionPool {
    sessions: Semaphore,
    queries: AtomicU64,
}

impl SessionPool {
    fn new(size: usize) -> Self {
        Self {
            sessions: Semaphore::new(size),
            queries: AtomicU64::new(0),
        }
    }
}

impl Operation for SessionPool {
    async fn execute(&self) -> Result<(), OperationError> {
        let _session = self
            .sessions
            .acquire()
            .await
            .map_err(|_| OperationError::new("session pool closed"))?;
        self.queries.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(25)).await;
        Ok(())
    }

    async fn shutdown(&self) {
        self.sessions.close();
        info!(
            "Closed session pool after {} queries",
            self.queries.load(Ordering::Relaxed)
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("pacer=info,pooled_operation=info")
        .init();

    let config = RunConfig::new(40, 5, 1.)?.with_name("pooled");
    let pool = SessionPool::new(config.pool_capacity());
    Scheduler::new(config, pool).run().await;
    Ok(())
}
