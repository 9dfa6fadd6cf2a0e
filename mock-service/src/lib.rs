//! A local HTTP target for load tests: fixed-delay, always-failing and rate-limited endpoints.
use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::debug;

#[derive(Clone, Default)]
pub struct MockState {
    requests: Arc<AtomicU64>,
    limiters: Arc<RwLock<HashMap<String, Arc<DefaultDirectRateLimiter>>>>,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub requests: u64,
}

pub fn app() -> Router {
    Router::new()
        .route("/delay/ms/:delay_ms", get(delay))
        .route("/fail/ms/:delay_ms", get(fail))
        .route(
            "/max/:max_tps/delay/ms/:delay_ms/target/:target",
            get(max),
        )
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(MockState::default())
}

pub async fn run(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    serve(listener).await
}

pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, app()).await
}

#[debug_handler]
async fn delay(State(state): State<MockState>, Path(delay_ms): Path<u64>) {
    state.record();
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

#[debug_handler]
async fn fail(State(state): State<MockState>, Path(delay_ms): Path<u64>) -> StatusCode {
    state.record();
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Serves at most `max_tps` successful requests per second per target; the rest get a 500.
#[debug_handler]
async fn max(
    State(state): State<MockState>,
    Path((max_tps, delay_ms, target)): Path<(u32, u64, String)>,
) -> Result<(), StatusCode> {
    state.record();
    let max_tps = NonZeroU32::new(max_tps).ok_or(StatusCode::BAD_REQUEST)?;
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    let limiter = state.limiter(target, max_tps);
    match limiter.check() {
        Ok(_) => Ok(()),
        Err(_) => {
            debug!("Rate limited");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn stats(State(state): State<MockState>) -> Json<Stats> {
    Json(Stats {
        requests: state.requests.load(Ordering::Relaxed),
    })
}

impl MockState {
    fn record(&self) {
        counter!("mock-service.requests").increment(1);
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    fn limiter(&self, target: String, max_tps: NonZeroU32) -> Arc<DefaultDirectRateLimiter> {
        let existing = self
            .limiters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&target)
            .cloned();
        if let Some(limiter) = existing {
            return limiter;
        }

        self.limiters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(target)
            .or_insert_with(|| Arc::new(rate_limiter(max_tps)))
            .clone()
    }
}

pub fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}
