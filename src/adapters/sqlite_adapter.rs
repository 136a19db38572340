//! SQLite stores for news articles and score records.
//!
//! The two stores live in separate database files. Each file gets its own
//! `SqliteAdapter`; both tables are created on every file so either port can
//! be served by either handle.

use crate::domain::article::NewsArticle;
use crate::domain::calendar::DATE_FORMAT;
use crate::domain::error::TickerScoreError;
use crate::domain::score::ScoreRecord;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::{NewsStorePort, ScoreStorePort};
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub const DEFAULT_NEWS_PATH: &str = "news_articles.db";
pub const DEFAULT_SCORES_PATH: &str = "sentiment_scores.db";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> TickerScoreError {
    TickerScoreError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(date_str: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            date_str.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl SqliteAdapter {
    /// Open the database named by `[sqlite] <key>`, falling back to `default_path`.
    pub fn from_config(
        config: &dyn ConfigPort,
        key: &str,
        default_path: &str,
    ) -> Result<Self, TickerScoreError> {
        let db_path = config
            .get_string("sqlite", key)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| default_path.to_string());
        let pool_size = config.get_int("sqlite", "pool_size", 1).max(1) as u32;

        Self::open(&db_path, pool_size)
    }

    pub fn open(db_path: &str, pool_size: u32) -> Result<Self, TickerScoreError> {
        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| TickerScoreError::Database {
                reason: format!("{db_path}: {e}"),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TickerScoreError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TickerScoreError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TickerScoreError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| TickerScoreError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), TickerScoreError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS news_articles (
                date TEXT,
                ticker TEXT,
                title TEXT,
                description TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_news_ticker ON news_articles(ticker);
            CREATE TABLE IF NOT EXISTS sentiment_scores (
                date TEXT,
                ticker TEXT,
                vader_sentiment REAL,
                gpt_sentiment REAL,
                historical_price_high REAL,
                historical_price_low REAL,
                aggregated_score REAL,
                recent_price REAL,
                rsi REAL,
                macd REAL
            );
            CREATE INDEX IF NOT EXISTS idx_scores_ticker ON sentiment_scores(ticker);",
        )
        .map_err(query_err)?;

        Ok(())
    }
}

impl NewsStorePort for SqliteAdapter {
    fn insert_article(&self, article: &NewsArticle) -> Result<(), TickerScoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO news_articles (date, ticker, title, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                article.timestamp,
                article.ticker,
                article.title,
                article.description
            ],
        )
        .map_err(query_err)?;
        Ok(())
    }

    fn articles_for(&self, ticker: &str) -> Result<Vec<NewsArticle>, TickerScoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, ticker, title, description
                 FROM news_articles
                 WHERE ticker = ?1
                 ORDER BY rowid ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![ticker], |row| {
                Ok(NewsArticle {
                    timestamp: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    ticker: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })
            .map_err(query_err)?;

        let mut articles = Vec::new();
        for row in rows {
            articles.push(row.map_err(query_err)?);
        }
        Ok(articles)
    }
}

impl ScoreStorePort for SqliteAdapter {
    fn insert_record(&self, record: &ScoreRecord) -> Result<(), TickerScoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sentiment_scores (date, ticker, vader_sentiment, gpt_sentiment,
                 historical_price_high, historical_price_low, aggregated_score,
                 recent_price, rsi, macd)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.date.format(DATE_FORMAT).to_string(),
                record.ticker,
                record.vader_sentiment_sum,
                record.gpt_sentiment_sum,
                record.historical_high,
                record.historical_low,
                record.aggregated_score,
                record.recent_price,
                record.rsi,
                record.macd
            ],
        )
        .map_err(query_err)?;
        Ok(())
    }

    fn records_for(&self, ticker: &str) -> Result<Vec<ScoreRecord>, TickerScoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, ticker, vader_sentiment, gpt_sentiment, historical_price_high,
                        historical_price_low, aggregated_score, recent_price, rsi, macd
                 FROM sentiment_scores
                 WHERE ticker = ?1
                 ORDER BY date ASC, rowid ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![ticker], |row| {
                let date_str: String = row.get(0)?;
                Ok(ScoreRecord {
                    date: parse_date(&date_str)?,
                    ticker: row.get(1)?,
                    vader_sentiment_sum: row.get(2)?,
                    gpt_sentiment_sum: row.get(3)?,
                    historical_high: row.get(4)?,
                    historical_low: row.get(5)?,
                    aggregated_score: row.get(6)?,
                    recent_price: row.get(7)?,
                    rsi: row.get(8)?,
                    macd: row.get(9)?,
                })
            })
            .map_err(query_err)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(query_err)?);
        }
        Ok(records)
    }

    fn count_records(&self) -> Result<usize, TickerScoreError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sentiment_scores", [], |row| row.get(0))
            .map_err(query_err)?;
        Ok(count as usize)
    }

    fn latest_date(&self) -> Result<Option<NaiveDate>, TickerScoreError> {
        let conn = self.conn()?;
        let max: Option<String> = conn
            .query_row("SELECT MAX(date) FROM sentiment_scores", [], |row| row.get(0))
            .map_err(query_err)?;

        max.map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e: chrono::ParseError| {
                TickerScoreError::Database {
                    reason: e.to_string(),
                }
            })
        })
        .transpose()
    }
}
