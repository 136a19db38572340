//! Sentiment labels and the two classification strategies.
//!
//! - Lexicon: deterministic compound polarity binned into five labels.
//! - Generative: one language-model request per article, retried with a fixed
//!   delay; unparseable answers become `Unknown`, exhausted retries `Error`.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::domain::retry::{self, RetryPolicy, Sleeper};
use crate::ports::polarity_port::PolarityPort;
use crate::ports::sentiment_model_port::SentimentModelPort;

pub const SYSTEM_PROMPT: &str =
    "You are an analyst whose task is to assess the sentiment of financial news.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentLabel {
    VeryGood,
    Good,
    Neutral,
    Bad,
    VeryBad,
    Unknown,
    Error,
}

impl SentimentLabel {
    pub const CANONICAL: [SentimentLabel; 5] = [
        SentimentLabel::VeryGood,
        SentimentLabel::Good,
        SentimentLabel::Neutral,
        SentimentLabel::Bad,
        SentimentLabel::VeryBad,
    ];

    pub fn weight(self) -> f64 {
        match self {
            SentimentLabel::VeryGood => 1.0,
            SentimentLabel::Good => 0.5,
            SentimentLabel::Neutral => 0.0,
            SentimentLabel::Bad => -0.5,
            SentimentLabel::VeryBad => -1.0,
            SentimentLabel::Unknown | SentimentLabel::Error => 0.0,
        }
    }

    /// Bin a compound polarity score. Bins are left-closed; the top bin also
    /// includes 1.0. Out-of-range scores clamp to the outer bins.
    pub fn from_compound(score: f64) -> Self {
        if score.is_nan() {
            SentimentLabel::Unknown
        } else if score < -0.8 {
            SentimentLabel::VeryBad
        } else if score < -0.35 {
            SentimentLabel::Bad
        } else if score < 0.35 {
            SentimentLabel::Neutral
        } else if score < 0.8 {
            SentimentLabel::Good
        } else {
            SentimentLabel::VeryGood
        }
    }

    /// Interpret a model answer: only its first line counts, and it must be a
    /// canonical label verbatim.
    pub fn from_model_response(response: &str) -> Self {
        let first_line = response.trim().lines().next().unwrap_or("").trim();
        first_line.parse().unwrap_or(SentimentLabel::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::VeryGood => "Very good",
            SentimentLabel::Good => "Good",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Bad => "Bad",
            SentimentLabel::VeryBad => "Very bad",
            SentimentLabel::Unknown => "UNKNOWN",
            SentimentLabel::Error => "Error",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a sentiment label: {0:?}")]
pub struct UnknownLabel(pub String);

impl FromStr for SentimentLabel {
    type Err = UnknownLabel;

    /// Accepts the five canonical labels only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SentimentLabel::CANONICAL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

pub fn weight_sum(labels: &[SentimentLabel]) -> f64 {
    labels.iter().map(|l| l.weight()).sum()
}

pub fn user_prompt(ticker: &str, text: &str) -> String {
    format!(
        "As an analyst, assess the sentiment of the following information: {text}. \
         Would you categorize it as 'Very good', 'Good', 'Neutral', 'Bad' or 'Very bad' \
         in the context of {ticker}? Please limit your answer to 10 words."
    )
}

pub fn classify_lexicon(texts: &[String], scorer: &dyn PolarityPort) -> Vec<SentimentLabel> {
    texts
        .iter()
        .map(|text| SentimentLabel::from_compound(scorer.compound(text)))
        .collect()
}

pub struct GenerativeClassifier<'a> {
    model: &'a dyn SentimentModelPort,
    policy: RetryPolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a> GenerativeClassifier<'a> {
    pub fn new(
        model: &'a dyn SentimentModelPort,
        policy: RetryPolicy,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            model,
            policy,
            sleeper,
        }
    }

    pub fn classify(&self, ticker: &str, texts: &[String]) -> Vec<SentimentLabel> {
        texts
            .iter()
            .map(|text| self.classify_one(ticker, text))
            .collect()
    }

    /// Each article gets its own attempt budget.
    pub fn classify_one(&self, ticker: &str, text: &str) -> SentimentLabel {
        let prompt = user_prompt(ticker, text);
        debug!("model prompt: {}", prompt);

        let label = format!("{ticker}/sentiment");
        match retry::execute(&self.policy, self.sleeper, &label, |_| {
            self.model.complete(SYSTEM_PROMPT, &prompt)
        }) {
            Ok(response) => {
                debug!("model response: {}", response);
                SentimentLabel::from_model_response(&response)
            }
            Err(exhausted) => {
                warn!(
                    "sentiment request for {} failed after {} attempts: {}",
                    ticker, exhausted.attempts, exhausted.last_error
                );
                SentimentLabel::Error
            }
        }
    }
}
