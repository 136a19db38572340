//! Durable append-only stores for articles and score records.

use chrono::NaiveDate;

use crate::domain::article::NewsArticle;
use crate::domain::error::TickerScoreError;
use crate::domain::score::ScoreRecord;

pub trait NewsStorePort {
    /// Append one article. No deduplication.
    fn insert_article(&self, article: &NewsArticle) -> Result<(), TickerScoreError>;

    /// Every stored article for `ticker`, in insertion order.
    fn articles_for(&self, ticker: &str) -> Result<Vec<NewsArticle>, TickerScoreError>;
}

pub trait ScoreStorePort {
    fn insert_record(&self, record: &ScoreRecord) -> Result<(), TickerScoreError>;

    fn records_for(&self, ticker: &str) -> Result<Vec<ScoreRecord>, TickerScoreError>;

    fn count_records(&self) -> Result<usize, TickerScoreError>;

    fn latest_date(&self) -> Result<Option<NaiveDate>, TickerScoreError>;
}
