//! Run statistics
//!
//! `RunStats` accumulates one client's outcomes while its pipeline runs and
//! turns them into a `RunResults`. `TotalResults::from_runs` folds the
//! per-client results of a whole run into the cross-client summary.
//!
//! Conventions kept deliberately:
//! - latency figures only count acknowledged messages; with no samples all
//!   four of them are 0
//! - the per-client std is 0 when the client was configured for one message,
//!   and the sample std of fewer than two values is 0
//! - cross-client latency mean/std are the mean and std of the per-client
//!   means, not of all raw samples
//! - a zero denominator yields a ratio of 0

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Results of a single client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    pub id: usize,
    pub successes: i64,
    pub failures: i64,
    /// Seconds.
    pub run_time: f64,
    /// Milliseconds.
    pub msg_time_min: f64,
    pub msg_time_max: f64,
    pub msg_time_mean: f64,
    pub msg_time_std: f64,
    pub msgs_per_sec: f64,
}

impl RunResults {
    /// Fraction of this client's messages that were acknowledged.
    pub fn ratio(&self) -> f64 {
        ratio(self.successes, self.failures)
    }
}

/// Results of all clients of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalResults {
    pub ratio: f64,
    pub successes: i64,
    pub failures: i64,
    /// Wall-clock seconds from the first client start to the last result.
    pub total_run_time: f64,
    pub avg_run_time: f64,
    pub msg_time_min: f64,
    pub msg_time_max: f64,
    pub msg_time_mean_avg: f64,
    pub msg_time_mean_std: f64,
    pub total_msgs_per_sec: f64,
    pub avg_msgs_per_sec: f64,
}

impl TotalResults {
    /// Aggregates per-client results. Pure: same input, same output.
    pub fn from_runs(runs: &[RunResults], total_time: Duration) -> Self {
        let successes: i64 = runs.iter().map(|r| r.successes).sum();
        let failures: i64 = runs.iter().map(|r| r.failures).sum();

        let means: Vec<f64> = runs.iter().map(|r| r.msg_time_mean).collect();
        let throughputs: Vec<f64> = runs.iter().map(|r| r.msgs_per_sec).collect();
        let run_times: Vec<f64> = runs.iter().map(|r| r.run_time).collect();

        let msg_time_min = runs
            .iter()
            .map(|r| r.msg_time_min)
            .reduce(f64::min)
            .unwrap_or(0.0);
        let msg_time_max = runs
            .iter()
            .map(|r| r.msg_time_max)
            .reduce(f64::max)
            .unwrap_or(0.0);

        Self {
            ratio: ratio(successes, failures),
            successes,
            failures,
            total_run_time: total_time.as_secs_f64(),
            avg_run_time: mean(&run_times),
            msg_time_min,
            msg_time_max,
            msg_time_mean_avg: mean(&means),
            msg_time_mean_std: if runs.len() > 1 {
                sample_std(&means)
            } else {
                0.0
            },
            total_msgs_per_sec: throughputs.iter().sum(),
            avg_msgs_per_sec: mean(&throughputs),
        }
    }
}

/// Running counters of one client.
#[derive(Debug, Default)]
pub struct RunStats {
    successes: i64,
    failures: i64,
    /// Flight times of acknowledged messages, in milliseconds.
    times: Vec<f64>,
}

impl RunStats {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            times: Vec::with_capacity(count),
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, flight_time: Duration) {
        self.successes += 1;
        self.times.push(flight_time.as_secs_f64() * 1000.0);
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn accounted(&self) -> usize {
        (self.successes + self.failures) as usize
    }

    /// Builds the client's results. `count` is the configured message count,
    /// `run_time` the wall-clock span of the whole pipeline.
    pub fn finish(&self, id: usize, count: usize, run_time: Duration) -> RunResults {
        let secs = run_time.as_secs_f64();
        RunResults {
            id,
            successes: self.successes,
            failures: self.failures,
            run_time: secs,
            msg_time_min: min(&self.times),
            msg_time_max: max(&self.times),
            msg_time_mean: mean(&self.times),
            msg_time_std: if count > 1 {
                sample_std(&self.times)
            } else {
                0.0
            },
            msgs_per_sec: if secs > 0.0 {
                self.successes as f64 / secs
            } else {
                0.0
            },
        }
    }
}

pub fn ratio(successes: i64, failures: i64) -> f64 {
    let attempted = successes + failures;
    if attempted == 0 {
        0.0
    } else {
        successes as f64 / attempted as f64
    }
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n - 1) standard deviation.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}
