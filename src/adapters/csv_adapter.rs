//! CSV ticker list adapter.
//!
//! The file has a header row; symbols are read from one zero-based column.

use crate::domain::error::TickerScoreError;
use crate::ports::ticker_port::TickerPort;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_TICKER_COLUMN: usize = 2;

pub struct CsvTickerAdapter {
    path: PathBuf,
    column: usize,
}

impl CsvTickerAdapter {
    pub fn new(path: PathBuf, column: usize) -> Self {
        Self { path, column }
    }

    fn source_err(&self, reason: String) -> TickerScoreError {
        TickerScoreError::TickerSource {
            file: self.path.display().to_string(),
            reason,
        }
    }
}

impl TickerPort for CsvTickerAdapter {
    fn load_tickers(&self) -> Result<Vec<String>, TickerScoreError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| self.source_err(format!("failed to read: {}", e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut tickers = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.source_err(format!("CSV parse error: {}", e)))?;

            // Header is line 1.
            let cell = record.get(self.column).ok_or_else(|| {
                self.source_err(format!("line {} has no column {}", i + 2, self.column))
            })?;

            let symbol = cell.trim().to_uppercase();
            if !symbol.is_empty() {
                tickers.push(symbol);
            }
        }

        Ok(tickers)
    }
}
