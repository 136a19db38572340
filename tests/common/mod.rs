#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tickerscore::adapters::sqlite_adapter::SqliteAdapter;
use tickerscore::domain::article::NewsArticle;
use tickerscore::domain::checkpoint::Checkpoint;
use tickerscore::domain::error::TickerScoreError;
use tickerscore::domain::pipeline::{Pipeline, PipelineSettings};
use tickerscore::domain::report::ReportRow;
use tickerscore::domain::retry::Sleeper;
use tickerscore::ports::checkpoint_port::CheckpointPort;
use tickerscore::ports::market_data_port::{IndicatorPort, NewsPort};
use tickerscore::ports::polarity_port::PolarityPort;
use tickerscore::ports::report_port::ReportPort;
use tickerscore::ports::sentiment_model_port::SentimentModelPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn tickers(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

fn transient(url: &str) -> TickerScoreError {
    TickerScoreError::HttpStatus {
        url: url.to_string(),
        status: 503,
    }
}

/// Per-ticker market data. Tickers without explicit values get neutral
/// defaults: RSI 50, MACD 0.1, close 100, weekly closes 95..105.
pub struct MockMarket {
    pub news: HashMap<String, Vec<NewsArticle>>,
    pub rsi: HashMap<String, Option<f64>>,
    pub macd: HashMap<String, Option<f64>>,
    pub close: HashMap<String, Option<f64>>,
    pub closes: HashMap<String, Vec<f64>>,
    /// Remaining failures before `(ticker, endpoint)` succeeds; `u32::MAX` never does.
    pub failures: RefCell<HashMap<(String, String), u32>>,
    pub calls: RefCell<Vec<(String, String)>>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self {
            news: HashMap::new(),
            rsi: HashMap::new(),
            macd: HashMap::new(),
            close: HashMap::new(),
            closes: HashMap::new(),
            failures: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// `count` classifiable articles for `ticker`.
    pub fn with_articles(mut self, ticker: &str, count: usize) -> Self {
        let articles = (0..count)
            .map(|i| make_article(ticker, &format!("{ticker} headline {i}"), "Details"))
            .collect();
        self.news.insert(ticker.to_string(), articles);
        self
    }

    pub fn with_news(mut self, ticker: &str, articles: Vec<NewsArticle>) -> Self {
        self.news.insert(ticker.to_string(), articles);
        self
    }

    pub fn with_rsi(mut self, ticker: &str, rsi: Option<f64>) -> Self {
        self.rsi.insert(ticker.to_string(), rsi);
        self
    }

    pub fn with_macd(mut self, ticker: &str, macd: Option<f64>) -> Self {
        self.macd.insert(ticker.to_string(), macd);
        self
    }

    pub fn with_close(mut self, ticker: &str, close: Option<f64>) -> Self {
        self.close.insert(ticker.to_string(), close);
        self
    }

    pub fn with_closes(mut self, ticker: &str, closes: Vec<f64>) -> Self {
        self.closes.insert(ticker.to_string(), closes);
        self
    }

    pub fn failing(self, ticker: &str, endpoint: &str, times: u32) -> Self {
        self.failures
            .borrow_mut()
            .insert((ticker.to_string(), endpoint.to_string()), times);
        self
    }

    pub fn calls_for(&self, ticker: &str, endpoint: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(t, e)| t == ticker && e == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn reset_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, ticker: &str, endpoint: &str) -> Result<(), TickerScoreError> {
        self.calls
            .borrow_mut()
            .push((ticker.to_string(), endpoint.to_string()));

        let mut failures = self.failures.borrow_mut();
        match failures.get_mut(&(ticker.to_string(), endpoint.to_string())) {
            Some(remaining) if *remaining > 0 => {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                Err(transient(&format!("mock://{endpoint}/{ticker}")))
            }
            _ => Ok(()),
        }
    }
}

impl NewsPort for MockMarket {
    fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsArticle>, TickerScoreError> {
        self.record(ticker, "news")?;
        Ok(self.news.get(ticker).cloned().unwrap_or_default())
    }
}

impl IndicatorPort for MockMarket {
    fn fetch_rsi(&self, ticker: &str) -> Result<Option<f64>, TickerScoreError> {
        self.record(ticker, "rsi")?;
        Ok(self.rsi.get(ticker).copied().unwrap_or(Some(50.0)))
    }

    fn fetch_macd(&self, ticker: &str) -> Result<Option<f64>, TickerScoreError> {
        self.record(ticker, "macd")?;
        Ok(self.macd.get(ticker).copied().unwrap_or(Some(0.1)))
    }

    fn fetch_recent_close(&self, ticker: &str) -> Result<Option<f64>, TickerScoreError> {
        self.record(ticker, "recent_close")?;
        Ok(self.close.get(ticker).copied().unwrap_or(Some(100.0)))
    }

    fn fetch_weekly_closes(&self, ticker: &str) -> Result<Vec<f64>, TickerScoreError> {
        self.record(ticker, "weekly_closes")?;
        Ok(self
            .closes
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| vec![95.0, 100.0, 105.0]))
    }
}

pub fn make_article(ticker: &str, title: &str, description: &str) -> NewsArticle {
    NewsArticle {
        timestamp: "2024-03-01 12:00:00".to_string(),
        ticker: ticker.to_string(),
        title: title.to_string(),
        description: description.to_string(),
    }
}

/// Same compound score for every text.
pub struct FixedPolarity(pub f64);

impl PolarityPort for FixedPolarity {
    fn compound(&self, _text: &str) -> f64 {
        self.0
    }
}

/// Answers every prompt with `response`, failing the first `failures` calls.
pub struct MockModel {
    pub response: String,
    pub failures: Cell<u32>,
    pub calls: Cell<usize>,
    pub prompts: RefCell<Vec<String>>,
}

impl MockModel {
    pub fn answering(response: &str) -> Self {
        Self {
            response: response.to_string(),
            failures: Cell::new(0),
            calls: Cell::new(0),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(self, times: u32) -> Self {
        self.failures.set(times);
        self
    }
}

impl SentimentModelPort for MockModel {
    fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String, TickerScoreError> {
        self.calls.set(self.calls.get() + 1);
        self.prompts.borrow_mut().push(user_prompt.to_string());
        let remaining = self.failures.get();
        if remaining > 0 {
            if remaining != u32::MAX {
                self.failures.set(remaining - 1);
            }
            return Err(transient("mock://model"));
        }
        Ok(self.response.clone())
    }
}

/// Checkpoint held in memory; counts saves and can be made to fail.
pub struct MemoryCheckpoint {
    pub state: RefCell<Checkpoint>,
    pub saves: Cell<usize>,
    pub fail_saves: Cell<bool>,
}

impl MemoryCheckpoint {
    pub fn new() -> Self {
        Self::with(Checkpoint::default())
    }

    pub fn with(checkpoint: Checkpoint) -> Self {
        Self {
            state: RefCell::new(checkpoint),
            saves: Cell::new(0),
            fail_saves: Cell::new(false),
        }
    }

    pub fn snapshot(&self) -> Checkpoint {
        self.state.borrow().clone()
    }

    pub fn processed(&self) -> HashSet<String> {
        self.state.borrow().processed_tickers.iter().cloned().collect()
    }
}

impl CheckpointPort for MemoryCheckpoint {
    fn load(&self) -> Checkpoint {
        self.state.borrow().clone()
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<(), TickerScoreError> {
        if self.fail_saves.get() {
            return Err(TickerScoreError::Checkpoint {
                path: "memory".to_string(),
                reason: "disk full".to_string(),
            });
        }
        self.saves.set(self.saves.get() + 1);
        *self.state.borrow_mut() = checkpoint.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), TickerScoreError> {
        *self.state.borrow_mut() = Checkpoint::default();
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub reports: RefCell<Vec<Vec<ReportRow>>>,
}

impl RecordingReporter {
    pub fn last(&self) -> Vec<ReportRow> {
        self.reports.borrow().last().cloned().unwrap_or_default()
    }

    pub fn last_tickers(&self) -> Vec<String> {
        self.last().into_iter().map(|r| r.ticker).collect()
    }
}

impl ReportPort for RecordingReporter {
    fn write(&self, rows: &[ReportRow]) -> Result<(), TickerScoreError> {
        self.reports.borrow_mut().push(rows.to_vec());
        Ok(())
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays_ms(&self) -> Vec<u128> {
        self.delays.borrow().iter().map(|d| d.as_millis()).collect()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.borrow_mut().push(duration);
    }
}

/// Everything a pipeline needs, with in-memory SQLite stores.
pub struct Harness {
    pub market: MockMarket,
    pub polarity: FixedPolarity,
    pub model: MockModel,
    pub news_store: SqliteAdapter,
    pub score_store: SqliteAdapter,
    pub checkpoints: MemoryCheckpoint,
    pub reporter: RecordingReporter,
    pub sleeper: RecordingSleeper,
    pub settings: PipelineSettings,
}

impl Harness {
    /// Lexicon says Very good (0.9), model says Good.
    pub fn new(market: MockMarket) -> Self {
        let news_store = SqliteAdapter::in_memory().unwrap();
        news_store.initialize_schema().unwrap();
        let score_store = SqliteAdapter::in_memory().unwrap();
        score_store.initialize_schema().unwrap();

        Self {
            market,
            polarity: FixedPolarity(0.9),
            model: MockModel::answering("Good"),
            news_store,
            score_store,
            checkpoints: MemoryCheckpoint::new(),
            reporter: RecordingReporter::default(),
            sleeper: RecordingSleeper::default(),
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_model(mut self, model: MockModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoints = MemoryCheckpoint::with(checkpoint);
        self
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline {
            news: &self.market,
            indicators: &self.market,
            polarity: &self.polarity,
            model: &self.model,
            news_store: &self.news_store,
            score_store: &self.score_store,
            checkpoints: &self.checkpoints,
            reporter: &self.reporter,
            sleeper: &self.sleeper,
            settings: self.settings,
            run_date: date(2024, 3, 4),
        }
    }
}
