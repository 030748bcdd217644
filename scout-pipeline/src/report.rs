//! Console report for a finished run.

use std::fmt::Write;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::model::MergedRecord;
use crate::output::{OutputRow, CSV_HEADER};

const RULE_WIDTH: usize = 100;

/// Aggregate counts for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Complete gainer records extracted
    pub total_gainers: usize,
    /// Distinct codes seen on the margin calculator
    pub leverage_entries: usize,
    pub qualifying: usize,
    pub not_qualifying: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn new(records: &[MergedRecord], leverage_entries: usize, duration: Duration) -> Self {
        let qualifying = records
            .iter()
            .filter(|record| record.leverage_tag.qualifies())
            .count();
        Self {
            total_gainers: records.len(),
            leverage_entries,
            qualifying,
            not_qualifying: records.len() - qualifying,
            duration,
        }
    }

    pub fn log(&self, target: &str) {
        info!(
            total_gainers = self.total_gainers,
            leverage_entries = self.leverage_entries,
            qualifying = self.qualifying,
            not_qualifying = self.not_qualifying,
            duration_ms = self.duration.as_millis() as u64,
            target,
            "Run summary"
        );
    }

    pub fn render(&self, target: &str) -> String {
        let mut out = String::new();
        let rule = "=".repeat(RULE_WIDTH);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "EXECUTION SUMMARY");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Total top gainers:        {}", self.total_gainers);
        let _ = writeln!(out, "Leverage entries checked: {}", self.leverage_entries);
        let _ = writeln!(out, "Stocks with {target}x leverage:  {}", self.qualifying);
        let _ = writeln!(out, "Stocks without:           {}", self.not_qualifying);
        let _ = writeln!(out, "Execution time:           {:.1}s", self.duration.as_secs_f64());
        let _ = write!(out, "{rule}");
        out
    }
}

/// A title between two full-width rules.
pub fn banner(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{rule}\n{title}\n{rule}")
}

/// Fixed-width Stock Name / NSE / Leverage table.
pub fn results_table(rows: &[OutputRow]) -> String {
    let width = |header: &str, cell: fn(&OutputRow) -> &str| {
        rows.iter()
            .map(|row| cell(row).chars().count())
            .chain(std::iter::once(header.chars().count()))
            .max()
            .unwrap_or(0)
    };
    let name_width = width(CSV_HEADER[0], |row| &row.name);
    let code_width = width(CSV_HEADER[1], |row| &row.code);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$}  {:<code_width$}  {}",
        CSV_HEADER[0], CSV_HEADER[1], CSV_HEADER[2]
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<code_width$}  {}",
            row.name, row.code, row.leverage
        );
    }
    out.trim_end().to_string()
}
