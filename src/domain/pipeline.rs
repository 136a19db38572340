//! Two-pass resumable scoring pipeline.
//!
//! Pass 1 fetches news (persisted as it arrives), RSI and MACD for every
//! pending ticker. Pass 2 classifies the stored articles, fetches prices,
//! aggregates, persists the score record and saves the checkpoint before
//! moving to the next ticker. Tickers already in the checkpoint are never
//! touched again.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::domain::article::classifiable_texts;
use crate::domain::checkpoint::Checkpoint;
use crate::domain::error::TickerScoreError;
use crate::domain::indicator::{IndicatorSnapshot, high_low};
use crate::domain::report::{ReportRow, rank};
use crate::domain::retry::{self, RetryPolicy, Sleeper};
use crate::domain::score::{ScoreInputs, ScoreRecord, aggregate};
use crate::domain::sentiment::{GenerativeClassifier, classify_lexicon, weight_sum};
use crate::ports::checkpoint_port::CheckpointPort;
use crate::ports::market_data_port::{IndicatorPort, NewsPort};
use crate::ports::polarity_port::PolarityPort;
use crate::ports::report_port::ReportPort;
use crate::ports::sentiment_model_port::SentimentModelPort;
use crate::ports::store_port::{NewsStorePort, ScoreStorePort};

/// What to do with a ticker that cannot be scored this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipPolicy {
    /// Leave it unprocessed so the next run tries again.
    Retry,
    /// Mark it processed without a report row.
    Exclude,
}

impl FromStr for SkipPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "retry" => Ok(SkipPolicy::Retry),
            "exclude" => Ok(SkipPolicy::Exclude),
            other => Err(format!("expected 'retry' or 'exclude', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub fetch_retry: RetryPolicy,
    pub sentiment_retry: RetryPolicy,
    pub on_no_articles: SkipPolicy,
    pub on_fetch_failure: SkipPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fetch_retry: RetryPolicy::fetch_default(),
            sentiment_retry: RetryPolicy::generative_default(),
            on_no_articles: SkipPolicy::Retry,
            on_fetch_failure: SkipPolicy::Retry,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Scored(f64),
    AlreadyProcessed,
    NoArticles,
    MissingIndicator(&'static str),
    Failed(String),
}

impl fmt::Display for TickerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickerOutcome::Scored(score) => write!(f, "scored {score}"),
            TickerOutcome::AlreadyProcessed => write!(f, "already processed"),
            TickerOutcome::NoArticles => write!(f, "no classifiable articles"),
            TickerOutcome::MissingIndicator(field) => write!(f, "missing {field}"),
            TickerOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(String, TickerOutcome)>,
    /// Carried-over and new rows, ranked.
    pub report: Vec<ReportRow>,
}

impl RunSummary {
    pub fn outcome(&self, ticker: &str) -> Option<&TickerOutcome> {
        self.outcomes
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, o)| o)
    }

    pub fn scored_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, TickerOutcome::Scored(_)))
            .count()
    }
}

/// First occurrence of each ticker, in input order.
fn unique(tickers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

/// Values kept from the fetch pass for the score pass.
#[derive(Debug, Clone, Copy)]
struct Fetched {
    news_volume: usize,
    rsi: Option<f64>,
    macd: Option<f64>,
}

/// Everything the pipeline talks to, passed in explicitly.
pub struct Pipeline<'a> {
    pub news: &'a dyn NewsPort,
    pub indicators: &'a dyn IndicatorPort,
    pub polarity: &'a dyn PolarityPort,
    pub model: &'a dyn SentimentModelPort,
    pub news_store: &'a dyn NewsStorePort,
    pub score_store: &'a dyn ScoreStorePort,
    pub checkpoints: &'a dyn CheckpointPort,
    pub reporter: &'a dyn ReportPort,
    pub sleeper: &'a dyn Sleeper,
    pub settings: PipelineSettings,
    pub run_date: NaiveDate,
}

impl<'a> Pipeline<'a> {
    /// Process `tickers` in order and write the ranked report.
    ///
    /// Only store and checkpoint failures abort the run; per-ticker fetch
    /// failures and missing data are recorded as outcomes.
    pub fn run(&self, tickers: &[String]) -> Result<RunSummary, TickerScoreError> {
        let tickers = &unique(tickers);
        let mut checkpoint = self.checkpoints.load();
        let mut summary = RunSummary::default();
        info!(
            "Resuming with {} processed tickers and {} report rows",
            checkpoint.processed_tickers.len(),
            checkpoint.report_rows.len()
        );

        let fetched = self.fetch_pass(tickers, &mut checkpoint, &mut summary)?;
        self.score_pass(tickers, &fetched, &mut checkpoint, &mut summary)?;

        summary.report = rank(&checkpoint.report_rows);
        self.reporter.write(&summary.report)?;
        Ok(summary)
    }

    fn fetch_pass(
        &self,
        tickers: &[String],
        checkpoint: &mut Checkpoint,
        summary: &mut RunSummary,
    ) -> Result<HashMap<String, Fetched>, TickerScoreError> {
        info!("Importing news and indicators for {} tickers", tickers.len());
        let mut fetched = HashMap::new();

        for (i, ticker) in tickers.iter().enumerate() {
            if checkpoint.is_processed(ticker) {
                summary
                    .outcomes
                    .push((ticker.clone(), TickerOutcome::AlreadyProcessed));
                continue;
            }
            info!("Importing news for ticker #{}: {}", i + 1, ticker);
            match self.fetch_ticker(ticker) {
                Ok(f) => {
                    fetched.insert(ticker.clone(), f);
                }
                Err(e @ TickerScoreError::RetryExhausted { .. }) => {
                    error!("Fetching {} failed: {}", ticker, e);
                    self.skip(checkpoint, ticker, self.settings.on_fetch_failure)?;
                    summary
                        .outcomes
                        .push((ticker.clone(), TickerOutcome::Failed(e.to_string())));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(fetched)
    }

    fn fetch_ticker(&self, ticker: &str) -> Result<Fetched, TickerScoreError> {
        let articles = self.fetch(ticker, "news", || self.news.fetch_news(ticker))?;
        for article in &articles {
            self.news_store.insert_article(article)?;
        }
        info!(
            "Loaded and saved {} news articles for {} in the database",
            articles.len(),
            ticker
        );

        let rsi = self.fetch(ticker, "rsi", || self.indicators.fetch_rsi(ticker))?;
        let macd = self.fetch(ticker, "macd", || self.indicators.fetch_macd(ticker))?;

        Ok(Fetched {
            news_volume: articles.len(),
            rsi,
            macd,
        })
    }

    fn score_pass(
        &self,
        tickers: &[String],
        fetched: &HashMap<String, Fetched>,
        checkpoint: &mut Checkpoint,
        summary: &mut RunSummary,
    ) -> Result<(), TickerScoreError> {
        info!("Conducting sentiment analysis and scoring");

        for (i, ticker) in tickers.iter().enumerate() {
            let Some(f) = fetched.get(ticker) else {
                continue;
            };
            if checkpoint.is_processed(ticker) {
                continue;
            }

            info!("Processing ticker #{}: {}", i + 1, ticker);
            let outcome = match self.score_ticker(ticker, f, checkpoint) {
                Ok(outcome) => outcome,
                Err(e @ TickerScoreError::RetryExhausted { .. }) => {
                    error!("Scoring {} failed: {}", ticker, e);
                    self.skip(checkpoint, ticker, self.settings.on_fetch_failure)?;
                    TickerOutcome::Failed(e.to_string())
                }
                Err(e) => return Err(e),
            };
            summary.outcomes.push((ticker.clone(), outcome));
        }

        Ok(())
    }

    fn score_ticker(
        &self,
        ticker: &str,
        fetched: &Fetched,
        checkpoint: &mut Checkpoint,
    ) -> Result<TickerOutcome, TickerScoreError> {
        let articles = self.news_store.articles_for(ticker)?;
        let texts = classifiable_texts(&articles);
        if texts.is_empty() {
            warn!("No articles were processed for {}. Skipping.", ticker);
            self.skip(checkpoint, ticker, self.settings.on_no_articles)?;
            return Ok(TickerOutcome::NoArticles);
        }

        let mut snapshot = IndicatorSnapshot {
            rsi: fetched.rsi,
            macd: fetched.macd,
            news_volume: fetched.news_volume,
            ..IndicatorSnapshot::default()
        };
        if let Err(missing) = snapshot.require_momentum() {
            warn!("Skipping {}: {}", ticker, missing);
            return Ok(TickerOutcome::MissingIndicator(missing.field));
        }

        let vader = classify_lexicon(&texts, self.polarity);
        let generative =
            GenerativeClassifier::new(self.model, self.settings.sentiment_retry, self.sleeper);
        let gpt = generative.classify(ticker, &texts);
        if vader.is_empty() || gpt.is_empty() {
            warn!("No articles were processed for {}. Skipping.", ticker);
            self.skip(checkpoint, ticker, self.settings.on_no_articles)?;
            return Ok(TickerOutcome::NoArticles);
        }

        snapshot.recent_price = self.fetch(ticker, "recent_close", || {
            self.indicators.fetch_recent_close(ticker)
        })?;
        let closes = self.fetch(ticker, "weekly_closes", || {
            self.indicators.fetch_weekly_closes(ticker)
        })?;
        if let Some((high, low)) = high_low(&closes) {
            snapshot.historical_high = Some(high);
            snapshot.historical_low = Some(low);
        }

        let technical = match snapshot.require() {
            Ok(t) => t,
            Err(missing) => {
                warn!("Skipping {}: {}", ticker, missing);
                return Ok(TickerOutcome::MissingIndicator(missing.field));
            }
        };

        let inputs = ScoreInputs {
            vader_sum: weight_sum(&vader),
            gpt_sum: weight_sum(&gpt),
            num_articles: vader.len(),
            technical,
        };
        let score = aggregate(&inputs);

        self.score_store
            .insert_record(&ScoreRecord::new(self.run_date, ticker, &inputs, score))?;
        info!("Aggregated Score for {}: {}", ticker, score);

        checkpoint.record_scored(ticker, score);
        self.checkpoints.save(checkpoint)?;
        info!("Finished processing ticker {}", ticker);

        Ok(TickerOutcome::Scored(score))
    }

    /// One provider call under the fetch retry policy.
    fn fetch<T>(
        &self,
        ticker: &str,
        what: &str,
        mut call: impl FnMut() -> Result<T, TickerScoreError>,
    ) -> Result<T, TickerScoreError> {
        let label = format!("{ticker}/{what}");
        retry::execute(&self.settings.fetch_retry, self.sleeper, &label, |_| call()).map_err(
            |exhausted| TickerScoreError::RetryExhausted {
                reason: exhausted.last_error.to_string(),
                attempts: exhausted.attempts,
                operation: label.clone(),
            },
        )
    }

    fn skip(
        &self,
        checkpoint: &mut Checkpoint,
        ticker: &str,
        policy: SkipPolicy,
    ) -> Result<(), TickerScoreError> {
        if policy == SkipPolicy::Exclude {
            checkpoint.record_excluded(ticker);
            self.checkpoints.save(checkpoint)?;
        }
        Ok(())
    }
}
