//! Ranked report rows.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub ticker: String,
    pub score: f64,
}

impl ReportRow {
    pub fn new(ticker: &str, score: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            score,
        }
    }
}

/// Rows sorted by score, highest first. Equal scores keep their input order.
pub fn rank(rows: &[ReportRow]) -> Vec<ReportRow> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_descending() {
        let rows = vec![
            ReportRow::new("A", 0.1),
            ReportRow::new("B", 0.7),
            ReportRow::new("C", -0.4),
        ];
        let tickers: Vec<String> = rank(&rows).into_iter().map(|r| r.ticker).collect();
        assert_eq!(tickers, vec!["B", "A", "C"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let rows = vec![
            ReportRow::new("X", 0.5),
            ReportRow::new("Y", 0.9),
            ReportRow::new("Z", 0.5),
            ReportRow::new("W", 0.5),
        ];
        let tickers: Vec<String> = rank(&rows).into_iter().map(|r| r.ticker).collect();
        assert_eq!(tickers, vec!["Y", "X", "Z", "W"]);
    }

    #[test]
    fn nan_score_does_not_disturb_finite_order() {
        let rows = vec![
            ReportRow::new("A", 0.1),
            ReportRow::new("N", f64::NAN),
            ReportRow::new("B", 0.7),
            ReportRow::new("C", -0.4),
        ];
        let finite: Vec<String> = rank(&rows)
            .into_iter()
            .filter(|r| !r.score.is_nan())
            .map(|r| r.ticker)
            .collect();
        assert_eq!(finite, vec!["B", "A", "C"]);
    }

    #[test]
    fn rank_empty() {
        assert!(rank(&[]).is_empty());
    }
}
