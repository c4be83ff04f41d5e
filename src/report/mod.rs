//! Report rendering
//!
//! Turns the per-client results and the totals of a run into text, JSON
//! (`{ "runs": [...], "totals": {...} }`) or CSV (one row per client).

use std::fmt::Write as _;
use std::str::FromStr;

use csv::Writer;
use serde::{Deserialize, Serialize};

use crate::stats::{RunResults, TotalResults};
use crate::utils::error::{BenchError, ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(ConfigError::InvalidFormat(s.to_string())),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub runs: Vec<RunResults>,
    pub totals: TotalResults,
}

pub const CSV_COLUMNS: [&str; 7] = [
    "client_id",
    "run_time",
    "msg_time_min",
    "msg_time_max",
    "msg_time_mean",
    "msg_time_std",
    "msgs_per_sec",
];

impl Report {
    pub fn render(&self, format: OutputFormat) -> Result<String, BenchError> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => Ok(self.to_json()?),
            OutputFormat::Csv => self.to_csv(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    pub fn to_csv(&self) -> Result<String, BenchError> {
        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record(CSV_COLUMNS)?;
        for res in &self.runs {
            writer.write_record([
                res.id.to_string(),
                res.run_time.to_string(),
                res.msg_time_min.to_string(),
                res.msg_time_max.to_string(),
                res.msg_time_mean.to_string(),
                res.msg_time_std.to_string(),
                res.msgs_per_sec.to_string(),
            ])?;
        }
        writer.flush()?;

        let bytes = writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| BenchError::Io(std::io::Error::other(e)))
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for res in &self.runs {
            let _ = writeln!(out, "======= CLIENT {} =======", res.id);
            let _ = writeln!(
                out,
                "Ratio:               {:.3} ({}/{})",
                res.ratio(),
                res.successes,
                res.successes + res.failures
            );
            let _ = writeln!(out, "Runtime (s):         {:.3}", res.run_time);
            let _ = writeln!(out, "Msg time min (ms):   {:.3}", res.msg_time_min);
            let _ = writeln!(out, "Msg time max (ms):   {:.3}", res.msg_time_max);
            let _ = writeln!(out, "Msg time mean (ms):  {:.3}", res.msg_time_mean);
            let _ = writeln!(out, "Msg time std (ms):   {:.3}", res.msg_time_std);
            let _ = writeln!(out, "Bandwidth (msg/sec): {:.3}\n", res.msgs_per_sec);
        }

        let t = &self.totals;
        let _ = writeln!(out, "========= TOTAL ({}) =========", self.runs.len());
        let _ = writeln!(
            out,
            "Total Ratio:                 {:.3} ({}/{})",
            t.ratio,
            t.successes,
            t.successes + t.failures
        );
        let _ = writeln!(out, "Total Runtime (sec):         {:.3}", t.total_run_time);
        let _ = writeln!(out, "Average Runtime (sec):       {:.3}", t.avg_run_time);
        let _ = writeln!(out, "Msg time min (ms):           {:.3}", t.msg_time_min);
        let _ = writeln!(out, "Msg time max (ms):           {:.3}", t.msg_time_max);
        let _ = writeln!(out, "Msg time mean mean (ms):     {:.3}", t.msg_time_mean_avg);
        let _ = writeln!(out, "Msg time mean std (ms):      {:.3}", t.msg_time_mean_std);
        let _ = writeln!(out, "Average Bandwidth (msg/sec): {:.3}", t.avg_msgs_per_sec);
        let _ = writeln!(out, "Total Bandwidth (msg/sec):   {:.3}", t.total_msgs_per_sec);
        out
    }
}

#[cfg(test)]
pub(crate) mod tests;
