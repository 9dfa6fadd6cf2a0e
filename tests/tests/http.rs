mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;

    use pacer::prelude::*;
    use pacer::NullSink;
    use pacer_runtime::targets::HttpOperation;
    use reqwest::{Method, Url};
    use std::net::SocketAddr;

    fn url(addr: SocketAddr, path: &str) -> Url {
        Url::parse(&format!("http://{addr}{path}")).unwrap()
    }

    async fn request_count(addr: SocketAddr) -> u64 {
        let stats: serde_json::Value = reqwest::get(url(addr, "/stats"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        stats["requests"].as_u64().unwrap()
    }

    async fn run(addr: SocketAddr, path: &str, config: RunConfig) -> RunReport {
        let operation =
            HttpOperation::new(Method::GET, url(addr, path), config.pool_capacity()).unwrap();
        Scheduler::new(config, operation)
            .with_sink(NullSink)
            .run()
            .await
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ntest::timeout(20_000)]
    async fn fast_endpoint_succeeds() {
        let addr = mock_service().await;
        let config = RunConfig::new(20, 2, 2.).unwrap();
        let report = run(addr, "/delay/ms/1", config).await;

        assert_eq!(report.total_attempted, 40);
        assert_eq!(report.succeeded, 40);
        assert_eq!(report.failed, 0);
        assert_eq!(request_count(addr).await, 40);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ntest::timeout(20_000)]
    async fn server_errors_are_failures() {
        let addr = mock_service().await;
        let config = RunConfig::new(10, 2, 2.).unwrap();
        let report = run(addr, "/fail/ms/1", config).await;

        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 20);
        assert_eq!(report.timed_out, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ntest::timeout(20_000)]
    async fn slow_endpoint_times_out() {
        let addr = mock_service().await;
        let config = RunConfig::new(5, 2, 0.2).unwrap();
        let report = run(addr, "/delay/ms/2000", config).await;

        assert_eq!(report.total_attempted, 10);
        assert_eq!(report.failed, 10);
        assert_eq!(report.timed_out, 10);
        assert!(report.elapsed.as_secs_f64() < 3.);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ntest::timeout(20_000)]
    async fn rate_limited_endpoint_fails_partially() {
        let addr = mock_service().await;
        let config = RunConfig::new(40, 2, 2.).unwrap();
        let report = run(addr, "/max/10/delay/ms/1/target/partial", config).await;

        assert_eq!(report.total_attempted, 80);
        assert!(report.succeeded >= 10, "{report}");
        assert!(report.failed >= 40, "{report}");
        assert_eq!(report.succeeded + report.failed, 80);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ntest::timeout(20_000)]
    async fn cache_busting_still_hits_the_endpoint() {
        let addr = mock_service().await;
        let config = RunConfig::new(5, 1, 2.).unwrap();
        let operation = HttpOperation::new(Method::GET, url(addr, "/delay/ms/1"), 10)
            .unwrap()
            .cache_bust(true);
        let report = Scheduler::new(config, operation)
            .with_sink(NullSink)
            .run()
            .await;

        assert_eq!(report.succeeded, 5);
        assert_eq!(request_count(addr).await, 5);
    }
}
