//! Generative language model port used for sentiment classification.

use crate::domain::error::TickerScoreError;

pub trait SentimentModelPort {
    /// Send one system/user prompt pair and return the model's free-text answer.
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, TickerScoreError>;
}
