//! Resumable progress snapshot.
//!
//! The checkpoint is always replaced as a whole. A ticker appears in
//! `report_rows` only if it is also in `processed_tickers`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::report::ReportRow;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub processed_tickers: BTreeSet<String>,
    #[serde(default)]
    pub report_rows: Vec<ReportRow>,
}

impl Checkpoint {
    pub fn is_processed(&self, ticker: &str) -> bool {
        self.processed_tickers.contains(ticker)
    }

    /// Mark a scored ticker done and carry its row into the report.
    pub fn record_scored(&mut self, ticker: &str, score: f64) {
        if self.processed_tickers.insert(ticker.to_string()) {
            self.report_rows.push(ReportRow::new(ticker, score));
        }
    }

    /// Mark a ticker done without a report row.
    pub fn record_excluded(&mut self, ticker: &str) {
        self.processed_tickers.insert(ticker.to_string());
    }

    /// Tickers from `tickers` that still need work, in list order.
    pub fn pending<'a>(&self, tickers: &'a [String]) -> Vec<&'a str> {
        tickers
            .iter()
            .map(String::as_str)
            .filter(|t| !self.is_processed(t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_scored_adds_row_once() {
        let mut cp = Checkpoint::default();
        cp.record_scored("AAPL", 0.4);
        cp.record_scored("AAPL", 0.9);
        assert!(cp.is_processed("AAPL"));
        assert_eq!(cp.report_rows, vec![ReportRow::new("AAPL", 0.4)]);
    }

    #[test]
    fn record_excluded_has_no_row() {
        let mut cp = Checkpoint::default();
        cp.record_excluded("TSLA");
        assert!(cp.is_processed("TSLA"));
        assert!(cp.report_rows.is_empty());
    }

    #[test]
    fn pending_preserves_order() {
        let mut cp = Checkpoint::default();
        cp.record_scored("B", 0.1);
        let tickers = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(cp.pending(&tickers), vec!["A", "C"]);
    }

    #[test]
    fn json_shape() {
        let mut cp = Checkpoint::default();
        cp.record_scored("MSFT", 0.25);
        let json = serde_json::to_string(&cp).unwrap();
        assert_eq!(
            json,
            r#"{"processed_tickers":["MSFT"],"report_rows":[{"ticker":"MSFT","score":0.25}]}"#
        );
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cp);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let cp: Checkpoint = serde_json::from_str("{}").unwrap();
        assert_eq!(cp, Checkpoint::default());
    }
}
