//! Aggregated score: six signals fused into one number.

use chrono::NaiveDate;

use crate::domain::indicator::TechnicalInputs;

pub const HIGH_NEWS_VOLUME: usize = 10;
pub const LOW_NEWS_VOLUME: usize = 5;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub vader_sum: f64,
    pub gpt_sum: f64,
    /// Articles that produced a label; must be non-zero.
    pub num_articles: usize,
    pub technical: TechnicalInputs,
}

fn sign_outside(value: f64, low: f64, high: f64) -> f64 {
    if value < low {
        -1.0
    } else if value > high {
        1.0
    } else {
        0.0
    }
}

pub fn price_score(recent_price: f64, historical_high: f64, historical_low: f64) -> f64 {
    sign_outside(recent_price, historical_low, historical_high)
}

pub fn volume_score(news_volume: usize) -> f64 {
    if news_volume > HIGH_NEWS_VOLUME {
        1.0
    } else if news_volume < LOW_NEWS_VOLUME {
        -1.0
    } else {
        0.0
    }
}

pub fn rsi_score(rsi: f64) -> f64 {
    sign_outside(rsi, RSI_OVERSOLD, RSI_OVERBOUGHT)
}

pub fn macd_score(macd: f64) -> f64 {
    sign_outside(macd, 0.0, 0.0)
}

/// Mean of the two normalized sentiment scores and the four indicator scores.
/// The result is not clamped.
pub fn aggregate(inputs: &ScoreInputs) -> f64 {
    let n = inputs.num_articles as f64;
    let t = &inputs.technical;

    let vader_score = inputs.vader_sum / n;
    let gpt_score = inputs.gpt_sum / n;

    (vader_score
        + gpt_score
        + price_score(t.recent_price, t.historical_high, t.historical_low)
        + volume_score(t.news_volume)
        + rsi_score(t.rsi)
        + macd_score(t.macd))
        / 6.0
}

/// One persisted row per ticker per run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub vader_sentiment_sum: f64,
    pub gpt_sentiment_sum: f64,
    pub historical_high: f64,
    pub historical_low: f64,
    pub aggregated_score: f64,
    pub recent_price: f64,
    pub rsi: f64,
    pub macd: f64,
}

impl ScoreRecord {
    pub fn new(date: NaiveDate, ticker: &str, inputs: &ScoreInputs, aggregated_score: f64) -> Self {
        let t = &inputs.technical;
        Self {
            date,
            ticker: ticker.to_string(),
            vader_sentiment_sum: inputs.vader_sum,
            gpt_sentiment_sum: inputs.gpt_sum,
            historical_high: t.historical_high,
            historical_low: t.historical_low,
            aggregated_score,
            recent_price: t.recent_price,
            rsi: t.rsi,
            macd: t.macd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn technical(recent_price: f64, news_volume: usize, rsi: f64, macd: f64) -> TechnicalInputs {
        TechnicalInputs {
            rsi,
            macd,
            recent_price,
            historical_high: 100.0,
            historical_low: 90.0,
            news_volume,
        }
    }

    #[test]
    fn worked_example() {
        let inputs = ScoreInputs {
            vader_sum: 2.0,
            gpt_sum: 1.0,
            num_articles: 2,
            technical: technical(105.0, 12, 75.0, 0.5),
        };
        assert_relative_eq!(aggregate(&inputs), 5.5 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(aggregate(&inputs), 0.91667, epsilon = 1e-5);
    }

    #[test]
    fn all_bearish() {
        let inputs = ScoreInputs {
            vader_sum: -3.0,
            gpt_sum: -3.0,
            num_articles: 3,
            technical: technical(80.0, 1, 20.0, -1.5),
        };
        assert_relative_eq!(aggregate(&inputs), -1.0);
    }

    #[test]
    fn indicator_thresholds_are_exclusive() {
        assert_eq!(price_score(100.0, 100.0, 90.0), 0.0);
        assert_eq!(price_score(90.0, 100.0, 90.0), 0.0);
        assert_eq!(price_score(89.99, 100.0, 90.0), -1.0);

        assert_eq!(volume_score(10), 0.0);
        assert_eq!(volume_score(11), 1.0);
        assert_eq!(volume_score(5), 0.0);
        assert_eq!(volume_score(4), -1.0);

        assert_eq!(rsi_score(30.0), 0.0);
        assert_eq!(rsi_score(70.0), 0.0);
        assert_eq!(rsi_score(29.9), -1.0);
        assert_eq!(rsi_score(70.1), 1.0);

        assert_eq!(macd_score(0.0), 0.0);
        assert_eq!(macd_score(-0.01), -1.0);
        assert_eq!(macd_score(0.01), 1.0);
    }

    #[test]
    fn record_copies_inputs() {
        let inputs = ScoreInputs {
            vader_sum: 1.5,
            gpt_sum: -0.5,
            num_articles: 4,
            technical: technical(95.0, 6, 50.0, 0.1),
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let record = ScoreRecord::new(date, "AAPL", &inputs, 0.2);
        assert_eq!(record.ticker, "AAPL");
        assert_eq!(record.vader_sentiment_sum, 1.5);
        assert_eq!(record.gpt_sentiment_sum, -0.5);
        assert_eq!(record.historical_high, 100.0);
        assert_eq!(record.historical_low, 90.0);
        assert_eq!(record.recent_price, 95.0);
        assert_eq!(record.aggregated_score, 0.2);
    }

    proptest! {
        #[test]
        fn stays_within_unit_range(
            weights in proptest::collection::vec(
                prop_oneof![Just(-1.0), Just(-0.5), Just(0.0), Just(0.5), Just(1.0)],
                1..20,
            ),
            price in 50.0f64..150.0,
            volume in 0usize..30,
            rsi in 0.0f64..100.0,
            macd in -5.0f64..5.0,
        ) {
            let sum: f64 = weights.iter().sum();
            let inputs = ScoreInputs {
                vader_sum: sum,
                gpt_sum: -sum,
                num_articles: weights.len(),
                technical: technical(price, volume, rsi, macd),
            };
            let score = aggregate(&inputs);
            prop_assert!((-1.0..=1.0).contains(&score));
        }
    }
}
