//! Plain-text report adapter implementing ReportPort.
//!
//! Writes `Report:` followed by one `TICKER: score` line per row, and
//! optionally echoes the rows to stdout.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::domain::error::TickerScoreError;
use crate::domain::report::ReportRow;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_REPORT_PATH: &str = "report.txt";

fn render_lines(rows: &[ReportRow]) -> String {
    rows.iter()
        .map(|row| format!("{}: {}\n", row.ticker, row.score))
        .collect()
}

/// File body for `rows`.
pub fn render_report(rows: &[ReportRow]) -> String {
    format!("Report:\n{}", render_lines(rows))
}

pub struct TextReportAdapter {
    path: PathBuf,
    echo_stdout: bool,
}

impl TextReportAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            echo_stdout: true,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.echo_stdout = false;
        self
    }
}

impl ReportPort for TextReportAdapter {
    fn write(&self, rows: &[ReportRow]) -> Result<(), TickerScoreError> {
        if self.echo_stdout {
            print!("Here is your report:\n{}", render_lines(rows));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, render_report(rows))?;
        info!("Report written to {}", self.path.display());

        Ok(())
    }
}
