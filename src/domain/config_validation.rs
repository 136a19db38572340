//! Configuration validation.
//!
//! Validates all config fields before a run and builds the pipeline settings.

use std::time::Duration;

use crate::domain::error::TickerScoreError;
use crate::domain::pipeline::{PipelineSettings, SkipPolicy};
use crate::domain::retry::{Backoff, RetryPolicy};
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TickerScoreError> {
    validate_ticker_column(config)?;
    validate_pool_size(config)?;
    validate_timeouts(config)?;
    validate_max_tokens(config)?;
    build_pipeline_settings(config)?;
    Ok(())
}

/// Both API keys, from the config file or the environment.
pub fn validate_credentials(config: &dyn ConfigPort) -> Result<(), TickerScoreError> {
    api_key(config, "polygon", "POLYGON_API_KEY")?;
    api_key(config, "openai", "OPENAI_API_KEY")?;
    Ok(())
}

pub fn api_key(
    config: &dyn ConfigPort,
    section: &str,
    env_var: &str,
) -> Result<String, TickerScoreError> {
    config
        .require_string(section, "api_key")
        .or_else(|_| match std::env::var(env_var) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(TickerScoreError::ConfigMissing {
                section: section.to_string(),
                key: format!("api_key (or {env_var})"),
            }),
        })
}

pub fn build_pipeline_settings(
    config: &dyn ConfigPort,
) -> Result<PipelineSettings, TickerScoreError> {
    let defaults = PipelineSettings::default();
    Ok(PipelineSettings {
        fetch_retry: build_fetch_retry(config)?,
        sentiment_retry: build_sentiment_retry(config)?,
        on_no_articles: skip_policy(config, "on_no_articles", defaults.on_no_articles)?,
        on_fetch_failure: skip_policy(config, "on_fetch_failure", defaults.on_fetch_failure)?,
    })
}

fn build_fetch_retry(config: &dyn ConfigPort) -> Result<RetryPolicy, TickerScoreError> {
    let max_attempts = positive_int(config, "retry", "max_attempts", 7)?;
    let initial = non_negative_int(config, "retry", "initial_delay_ms", 1000)?;
    let max = non_negative_int(config, "retry", "max_delay_ms", 10_000)?;
    if max < initial {
        return Err(TickerScoreError::ConfigInvalid {
            section: "retry".to_string(),
            key: "max_delay_ms".to_string(),
            reason: "max_delay_ms must not be less than initial_delay_ms".to_string(),
        });
    }
    Ok(RetryPolicy {
        max_attempts: max_attempts as u32,
        backoff: Backoff::Exponential {
            initial: Duration::from_millis(initial),
            max: Duration::from_millis(max),
        },
    })
}

fn build_sentiment_retry(config: &dyn ConfigPort) -> Result<RetryPolicy, TickerScoreError> {
    let max_attempts = positive_int(config, "sentiment", "max_attempts", 4)?;
    let delay = non_negative_int(config, "sentiment", "retry_delay_ms", 2000)?;
    Ok(RetryPolicy {
        max_attempts: max_attempts as u32,
        backoff: Backoff::Fixed(Duration::from_millis(delay)),
    })
}

fn skip_policy(
    config: &dyn ConfigPort,
    key: &str,
    default: SkipPolicy,
) -> Result<SkipPolicy, TickerScoreError> {
    match config.get_string("pipeline", key) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|reason| TickerScoreError::ConfigInvalid {
                section: "pipeline".to_string(),
                key: key.to_string(),
                reason,
            }),
    }
}

fn validate_ticker_column(config: &dyn ConfigPort) -> Result<(), TickerScoreError> {
    non_negative_int(config, "paths", "ticker_column", 2)?;
    Ok(())
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<(), TickerScoreError> {
    positive_int(config, "sqlite", "pool_size", 1)?;
    Ok(())
}

fn validate_timeouts(config: &dyn ConfigPort) -> Result<(), TickerScoreError> {
    positive_int(config, "polygon", "timeout_secs", 10)?;
    positive_int(config, "openai", "timeout_secs", 60)?;
    Ok(())
}

fn validate_max_tokens(config: &dyn ConfigPort) -> Result<(), TickerScoreError> {
    positive_int(config, "openai", "max_tokens", 300)?;
    Ok(())
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<u64, TickerScoreError> {
    let value = config.get_int(section, key, default);
    if value <= 0 {
        return Err(TickerScoreError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be positive"),
        });
    }
    Ok(value as u64)
}

fn non_negative_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<u64, TickerScoreError> {
    let value = config.get_int(section, key, default);
    if value < 0 {
        return Err(TickerScoreError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be non-negative"),
        });
    }
    Ok(value as u64)
}
