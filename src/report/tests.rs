use super::*;
use std::time::Duration;

fn sample_report() -> Report {
    let runs = vec![
        RunResults {
            id: 0,
            successes: 5,
            failures: 0,
            run_time: 0.5,
            msg_time_min: 10.0,
            msg_time_max: 50.0,
            msg_time_mean: 30.0,
            msg_time_std: 15.811,
            msgs_per_sec: 10.0,
        },
        RunResults {
            id: 1,
            successes: 2,
            failures: 1,
            run_time: 0.25,
            msg_time_min: 10.0,
            msg_time_max: 20.0,
            msg_time_mean: 15.0,
            msg_time_std: 7.071,
            msgs_per_sec: 8.0,
        },
    ];
    let totals = TotalResults::from_runs(&runs, Duration::from_millis(600));
    Report { runs, totals }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

/// Float fields may differ in the last bit after a JSON round trip.
pub(crate) fn assert_reports_close(a: &Report, b: &Report) {
    assert_eq!(a.runs.len(), b.runs.len());
    for (x, y) in a.runs.iter().zip(&b.runs) {
        assert_eq!((x.id, x.successes, x.failures), (y.id, y.successes, y.failures));
        for (u, v) in [
            (x.run_time, y.run_time),
            (x.msg_time_min, y.msg_time_min),
            (x.msg_time_max, y.msg_time_max),
            (x.msg_time_mean, y.msg_time_mean),
            (x.msg_time_std, y.msg_time_std),
            (x.msgs_per_sec, y.msgs_per_sec),
        ] {
            assert!(close(u, v), "client {}: {u} != {v}", x.id);
        }
    }

    let (x, y) = (&a.totals, &b.totals);
    assert_eq!((x.successes, x.failures), (y.successes, y.failures));
    for (u, v) in [
        (x.ratio, y.ratio),
        (x.total_run_time, y.total_run_time),
        (x.avg_run_time, y.avg_run_time),
        (x.msg_time_min, y.msg_time_min),
        (x.msg_time_max, y.msg_time_max),
        (x.msg_time_mean_avg, y.msg_time_mean_avg),
        (x.msg_time_mean_std, y.msg_time_mean_std),
        (x.total_msgs_per_sec, y.total_msgs_per_sec),
        (x.avg_msgs_per_sec, y.avg_msgs_per_sec),
    ] {
        assert!(close(u, v), "totals: {u} != {v}");
    }
}

#[test]
fn test_output_format_parse() {
    assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
    assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
    assert!("yaml".parse::<OutputFormat>().is_err());
}

#[test]
fn test_json_document_shape() {
    let report = sample_report();
    let json = report.render(OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let runs = value["runs"].as_array().expect("runs array");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1]["id"], 1);
    assert_eq!(runs[1]["failures"], 1);
    assert_eq!(runs[0]["msg_time_mean"], 30.0);

    let totals = &value["totals"];
    assert_eq!(totals["successes"], 7);
    assert_eq!(totals["failures"], 1);
    assert_eq!(totals["total_run_time"], 0.6);
    assert!(totals.get("msg_time_mean_avg").is_some());
    assert!(totals.get("avg_msgs_per_sec").is_some());

    let back: Report = serde_json::from_str(&json).unwrap();
    assert_reports_close(&back, &report);
}

#[test]
fn test_csv_rows() {
    let csv = sample_report().render(OutputFormat::Csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_COLUMNS.join(","));
    assert_eq!(lines[1], "0,0.5,10,50,30,15.811,10");
    assert_eq!(lines[2], "1,0.25,10,20,15,7.071,8");
}

#[test]
fn test_text_blocks() {
    let text = sample_report().render(OutputFormat::Text).unwrap();
    assert!(text.contains("======= CLIENT 0 ======="));
    assert!(text.contains("======= CLIENT 1 ======="));
    assert!(text.contains("Ratio:               0.667 (2/3)"));
    assert!(text.contains("Msg time mean (ms):  30.000"));
    assert!(text.contains("========= TOTAL (2) ========="));
    assert!(text.contains("Total Ratio:                 0.875 (7/8)"));
    assert!(text.contains("Total Bandwidth (msg/sec):   18.000"));
}

#[test]
fn test_text_with_no_attempts_does_not_divide_by_zero() {
    let runs = vec![RunResults {
        id: 0,
        successes: 0,
        failures: 0,
        run_time: 0.0,
        msg_time_min: 0.0,
        msg_time_max: 0.0,
        msg_time_mean: 0.0,
        msg_time_std: 0.0,
        msgs_per_sec: 0.0,
    }];
    let totals = TotalResults::from_runs(&runs, Duration::ZERO);
    let text = Report { runs, totals }.to_text();
    assert!(text.contains("Ratio:               0.000 (0/0)"));
    assert!(!text.contains("NaN"));
}
