//! News and indicator provider ports.
//!
//! Every method performs one blocking external call. Failures (transport,
//! non-2xx status, undecodable body) are returned as errors so the caller's
//! retry policy can decide what to do; "no data" is `Ok(None)` or an empty list.

use crate::domain::article::NewsArticle;
use crate::domain::error::TickerScoreError;

pub trait NewsPort {
    fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsArticle>, TickerScoreError>;
}

pub trait IndicatorPort {
    fn fetch_rsi(&self, ticker: &str) -> Result<Option<f64>, TickerScoreError>;

    fn fetch_macd(&self, ticker: &str) -> Result<Option<f64>, TickerScoreError>;

    /// Close of the previous business day.
    fn fetch_recent_close(&self, ticker: &str) -> Result<Option<f64>, TickerScoreError>;

    /// Daily closes over the trailing calendar week.
    fn fetch_weekly_closes(&self, ticker: &str) -> Result<Vec<f64>, TickerScoreError>;
}
