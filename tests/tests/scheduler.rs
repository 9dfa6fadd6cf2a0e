use pacer::prelude::*;
use pacer::{ConfigError, NullSink, WriterSink};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

async fn succeed() -> Result<(), String> {
    Ok(())
}

async fn fail() -> Result<(), String> {
    Err("query rejected".to_string())
}

async fn sleep_one_second() -> Result<(), String> {
    tokio::time::sleep(Duration::from_secs(1)).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn five_tps_for_three_seconds() {
    let config = RunConfig::new(5, 3, 1.).unwrap();
    let report = Scheduler::new(config, succeed)
        .with_sink(NullSink)
        .run()
        .await;

    assert_eq!(report.total_attempted, 15);
    assert_eq!(report.succeeded, 15);
    assert_eq!(report.failed, 0);
    assert_eq!(report.throughput, 5.0);
}

#[tokio::test(start_paused = true)]
async fn every_attempt_times_out() {
    let config = RunConfig::new(4, 2, 0.1).unwrap();
    let report = Scheduler::new(config, sleep_one_second)
        .with_sink(NullSink)
        .run()
        .await;

    assert_eq!(report.total_attempted, 8);
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed, 8);
    assert_eq!(report.throughput, 4.0);
}

#[test]
fn zero_tps_is_a_configuration_error() {
    assert_eq!(RunConfig::new(0, 3, 1.), Err(ConfigError::ZeroTps));
}

#[tokio::test(start_paused = true)]
async fn attempted_is_always_offered_load() {
    for (tps, duration) in [(1, 1), (1, 5), (7, 2), (20, 3)] {
        let config = RunConfig::new(tps, duration, 0.5).unwrap();

        let offered = config.total_offered();
        assert_eq!(offered, u64::from(tps * duration));

        let report = Scheduler::new(config.clone(), succeed)
            .with_sink(NullSink)
            .run()
            .await;
        assert_eq!(report.total_attempted, offered);
        assert_eq!(report.succeeded, report.total_attempted);
        assert_eq!(report.error_rate(), 0.);

        let report = Scheduler::new(config, fail)
            .with_sink(NullSink)
            .run()
            .await;
        assert_eq!(report.total_attempted, offered);
        assert_eq!(report.failed, report.total_attempted);
        assert_eq!(report.error_rate(), 1.);
        assert_eq!(report.succeeded, 0);
    }
}

#[tokio::test(start_paused = true)]
async fn instant_operations_are_paced() {
    let start = Instant::now();
    let config = RunConfig::new(100, 4, 1.).unwrap();
    let report = Scheduler::new(config, succeed)
        .with_sink(NullSink)
        .run()
        .await;

    assert_eq!(report.elapsed, start.elapsed());
    assert!(report.elapsed >= Duration::from_secs(4));
    assert!(report.elapsed < Duration::from_millis(4_100));
}

/// Writer that can be inspected after the scheduler has consumed the sink.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn report_goes_to_injected_sink() {
    let buffer = SharedBuffer::default();
    let config = RunConfig::new(2, 2, 1.).unwrap().with_name("sink");
    Scheduler::new(config, fail)
        .with_sink(WriterSink::new(buffer.clone()))
        .run()
        .await;

    let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(text.contains("Run: sink"));
    assert!(text.contains("Total operations: 4"));
    assert!(text.contains("Failed operations: 4"));
    assert!(text.contains("QPS: 2.00"));
}

#[tokio::test(start_paused = true)]
async fn json_report() {
    let buffer = SharedBuffer::default();
    let config = RunConfig::new(3, 1, 1.).unwrap();
    let report = Scheduler::new(config, succeed)
        .with_sink(pacer::JsonSink::new(buffer.clone()))
        .run()
        .await;

    let bytes = buffer.0.lock().unwrap().clone();
    let parsed: RunReport = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed.total_attempted, report.total_attempted);
    assert_eq!(parsed.succeeded, 3);
    assert_eq!(parsed.throughput, 3.0);
}
