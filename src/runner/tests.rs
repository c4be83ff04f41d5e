use super::run;
use crate::config::{BenchConfig, Settings};
use crate::transport::memory::{MemoryConnection, Outcome};
use crate::utils::error::BenchError;
use std::time::Duration;

fn config(clients: i64, count: i64) -> BenchConfig {
    let mut settings = Settings::default();
    settings.bench.clients = clients;
    settings.bench.count = count;
    settings.broker.wait_ms = 100;
    settings.validate().expect("valid settings")
}

#[tokio::test]
async fn test_three_clients_all_succeed() {
    let cfg = config(3, 10);
    let report = run(&cfg, |_| MemoryConnection::instant()).await.unwrap();

    assert_eq!(report.runs.len(), 3);
    assert_eq!(report.totals.successes, 30);
    assert_eq!(report.totals.failures, 0);
    assert_eq!(report.totals.ratio, 1.0);

    let sum: f64 = report.runs.iter().map(|r| r.msgs_per_sec).sum();
    assert_eq!(report.totals.total_msgs_per_sec, sum);
    for r in &report.runs {
        assert_eq!(r.successes + r.failures, 10);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_results_sorted_by_client_id() {
    let cfg = config(8, 5);
    // later clients finish first
    let report = run(&cfg, |id| {
        let delay = (8 - id as u64) * 3;
        MemoryConnection::with_latencies(&[delay; 5])
    })
    .await
    .unwrap();

    let ids: Vec<usize> = report.runs.iter().map(|r| r.id).collect();
    assert_eq!(ids, (0..8).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_data_not_errors() {
    let cfg = config(2, 3);
    let report = run(&cfg, |id| {
        if id == 0 {
            MemoryConnection::refusing()
        } else {
            MemoryConnection::scripted([
                Outcome::Ack(Duration::from_millis(10)),
                Outcome::Hang,
                Outcome::Fail,
            ])
        }
    })
    .await
    .expect("runtime failures never abort the run");

    assert_eq!(report.runs[0].successes, 0);
    assert_eq!(report.runs[0].failures, 3);
    assert_eq!(report.runs[1].successes, 1);
    assert_eq!(report.runs[1].failures, 2);
    assert_eq!(report.totals.successes, 1);
    assert_eq!(report.totals.failures, 5);
    assert!((report.totals.ratio - 1.0 / 6.0).abs() < 1e-12);
}

#[tokio::test(start_paused = true)]
async fn test_total_run_time_is_wall_clock_not_sum() {
    let cfg = config(4, 2);
    let report = run(&cfg, |_| MemoryConnection::with_latencies(&[50, 50]))
        .await
        .unwrap();

    let summed: f64 = report.runs.iter().map(|r| r.run_time).sum();
    assert!(report.totals.total_run_time < summed);
    assert!(report.totals.total_run_time >= 0.1);
}

#[tokio::test]
async fn test_every_client_connects_once() {
    let cfg = config(5, 3);
    let mut counters = Vec::new();
    let report = run(&cfg, |_| {
        let conn = MemoryConnection::instant();
        counters.push(conn.connects.clone());
        conn
    })
    .await
    .unwrap();

    assert_eq!(report.runs.len(), 5);
    assert_eq!(counters.len(), 5);
    assert!(counters.iter().all(|c| *c.lock().unwrap() == 1));
}

#[tokio::test]
async fn test_dead_publisher_fails_the_run() {
    let cfg = config(1, 5);
    let err = run(&cfg, |_| {
        MemoryConnection::scripted([Outcome::Ack(Duration::ZERO), Outcome::Crash])
    })
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        BenchError::ClientLost {
            expected: 1,
            received: 0
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_one_lost_client_among_many() {
    let cfg = config(3, 4);
    let err = run(&cfg, |id| {
        if id == 1 {
            MemoryConnection::scripted([Outcome::Crash])
        } else {
            MemoryConnection::instant()
        }
    })
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        BenchError::ClientLost {
            expected: 3,
            received: 2
        }
    ));
}

#[test]
fn test_client_lost_error_message() {
    let err = BenchError::ClientLost {
        expected: 3,
        received: 2,
    };
    assert_eq!(err.to_string(), "expected 3 client results, received 2");
}
