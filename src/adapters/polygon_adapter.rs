//! Polygon.io news and indicator adapter.
//!
//! One blocking GET per call. Response bodies are decoded by the pure
//! `parse_*` functions so they can be tested without a network.

use crate::domain::article::{NewsArticle, TIMESTAMP_FORMAT};
use crate::domain::calendar::{DATE_FORMAT, previous_business_day, trailing_week};
use crate::domain::error::TickerScoreError;
use crate::ports::market_data_port::{IndicatorPort, NewsPort};
use chrono::{NaiveDate, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const SOURCE: &str = "polygon";

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: Option<String>,
    #[serde(default)]
    results: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    title: Option<String>,
    description: Option<String>,
    published_utc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndicatorResponse {
    results: Option<IndicatorResults>,
}

#[derive(Debug, Deserialize)]
struct IndicatorResults {
    #[serde(default)]
    values: Vec<IndicatorValue>,
}

#[derive(Debug, Deserialize)]
struct IndicatorValue {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OpenCloseResponse {
    close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    results: Vec<AggregateBar>,
}

#[derive(Debug, Deserialize)]
struct AggregateBar {
    c: f64,
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, TickerScoreError> {
    serde_json::from_str(body).map_err(|e| TickerScoreError::Decode {
        source_name: SOURCE.to_string(),
        reason: e.to_string(),
    })
}

/// Articles from a news response. A status other than `OK` means no news.
pub fn parse_news(
    ticker: &str,
    body: &str,
    fallback_timestamp: &str,
) -> Result<Vec<NewsArticle>, TickerScoreError> {
    let response: NewsResponse = decode(body)?;
    if response.status.as_deref() != Some("OK") {
        debug!(
            "News response for {} has status {:?}",
            ticker, response.status
        );
        return Ok(Vec::new());
    }

    Ok(response
        .results
        .into_iter()
        .map(|item| NewsArticle {
            timestamp: item
                .published_utc
                .unwrap_or_else(|| fallback_timestamp.to_string()),
            ticker: ticker.to_string(),
            title: item.title.unwrap_or_default(),
            description: item.description.unwrap_or_default(),
        })
        .collect())
}

/// Most recent value of an RSI or MACD series.
pub fn parse_latest_indicator(body: &str) -> Result<Option<f64>, TickerScoreError> {
    let response: IndicatorResponse = decode(body)?;
    Ok(response
        .results
        .and_then(|r| r.values.into_iter().next())
        .and_then(|v| v.value))
}

pub fn parse_close(body: &str) -> Result<Option<f64>, TickerScoreError> {
    let response: OpenCloseResponse = decode(body)?;
    Ok(response.close)
}

pub fn parse_closes(body: &str) -> Result<Vec<f64>, TickerScoreError> {
    let response: AggregatesResponse = decode(body)?;
    Ok(response.results.into_iter().map(|bar| bar.c).collect())
}

pub struct PolygonAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    today: Option<NaiveDate>,
}

impl PolygonAdapter {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, TickerScoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TickerScoreError::Http {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            today: None,
        })
    }

    /// Pin the date used for the price endpoints.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn news_url(&self, ticker: &str) -> String {
        format!("{}/v2/reference/news?ticker={}", self.base_url, ticker)
    }

    pub fn indicator_url(&self, indicator: &str, ticker: &str) -> String {
        format!("{}/v1/indicators/{}/{}", self.base_url, indicator, ticker)
    }

    pub fn open_close_url(&self, ticker: &str) -> String {
        let day = previous_business_day(self.today());
        format!(
            "{}/v1/open-close/{}/{}?adjusted=true",
            self.base_url,
            ticker,
            day.format(DATE_FORMAT)
        )
    }

    pub fn aggregates_url(&self, ticker: &str) -> String {
        let (from, to) = trailing_week(self.today());
        format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            self.base_url,
            ticker,
            from.format(DATE_FORMAT),
            to.format(DATE_FORMAT)
        )
    }

    /// GET `url` with the API key attached and return the body of a 2xx response.
    fn get(&self, url: &str) -> Result<String, TickerScoreError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .map_err(|e| TickerScoreError::Http {
                url: url.to_string(),
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TickerScoreError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(|e| TickerScoreError::Http {
            url: url.to_string(),
            reason: e.without_url().to_string(),
        })
    }
}

impl NewsPort for PolygonAdapter {
    fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsArticle>, TickerScoreError> {
        let body = self.get(&self.news_url(ticker))?;
        let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        parse_news(ticker, &body, &now)
    }
}

impl IndicatorPort for PolygonAdapter {
    fn fetch_rsi(&self, ticker: &str) -> Result<Option<f64>, TickerScoreError> {
        parse_latest_indicator(&self.get(&self.indicator_url("rsi", ticker))?)
    }

    fn fetch_macd(&self, ticker: &str) -> Result<Option<f64>, TickerScoreError> {
        parse_latest_indicator(&self.get(&self.indicator_url("macd", ticker))?)
    }

    fn fetch_recent_close(&self, ticker: &str) -> Result<Option<f64>, TickerScoreError> {
        parse_close(&self.get(&self.open_close_url(ticker))?)
    }

    fn fetch_weekly_closes(&self, ticker: &str) -> Result<Vec<f64>, TickerScoreError> {
        parse_closes(&self.get(&self.aggregates_url(ticker))?)
    }
}
