//! Technical indicator snapshot gathered for one ticker.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub recent_price: Option<f64>,
    pub historical_high: Option<f64>,
    pub historical_low: Option<f64>,
    pub news_volume: usize,
}

/// Every indicator present; the only shape the aggregator accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechnicalInputs {
    pub rsi: f64,
    pub macd: f64,
    pub recent_price: f64,
    pub historical_high: f64,
    pub historical_low: f64,
    pub news_volume: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("missing indicator: {field}")]
pub struct MissingIndicator {
    pub field: &'static str,
}

fn present(value: Option<f64>, field: &'static str) -> Result<f64, MissingIndicator> {
    value.ok_or(MissingIndicator { field })
}

impl IndicatorSnapshot {
    pub fn require(&self) -> Result<TechnicalInputs, MissingIndicator> {
        Ok(TechnicalInputs {
            rsi: present(self.rsi, "rsi")?,
            macd: present(self.macd, "macd")?,
            recent_price: present(self.recent_price, "recent_price")?,
            historical_high: present(self.historical_high, "historical_high")?,
            historical_low: present(self.historical_low, "historical_low")?,
            news_volume: self.news_volume,
        })
    }

    /// Check only the momentum indicators fetched in the first pass.
    pub fn require_momentum(&self) -> Result<(), MissingIndicator> {
        present(self.rsi, "rsi")?;
        present(self.macd, "macd")?;
        Ok(())
    }
}

/// Highest and lowest close, or `None` when there are no closes.
pub fn high_low(closes: &[f64]) -> Option<(f64, f64)> {
    let mut iter = closes.iter().copied().filter(|c| c.is_finite());
    let first = iter.next()?;
    Some(iter.fold((first, first), |(high, low), c| (high.max(c), low.min(c))))
}
