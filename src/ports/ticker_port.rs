//! Ticker list source port.

use crate::domain::error::TickerScoreError;

pub trait TickerPort {
    /// Ticker symbols in processing order.
    fn load_tickers(&self) -> Result<Vec<String>, TickerScoreError>;
}
