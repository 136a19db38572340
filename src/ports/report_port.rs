//! Report generation port trait.

use crate::domain::error::TickerScoreError;
use crate::domain::report::ReportRow;

/// Port for rendering the ranked report.
pub trait ReportPort {
    /// `rows` arrive already ranked.
    fn write(&self, rows: &[ReportRow]) -> Result<(), TickerScoreError>;
}
