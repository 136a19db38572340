//! OpenAI-compatible chat completions adapter.

use crate::domain::error::TickerScoreError;
use crate::ports::sentiment_model_port::SentimentModelPort;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const SOURCE: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Text of the first choice. A response without one is a decode error.
pub fn parse_completion(body: &str) -> Result<String, TickerScoreError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| TickerScoreError::Decode {
            source_name: SOURCE.to_string(),
            reason: e.to_string(),
        })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| TickerScoreError::Decode {
            source_name: SOURCE.to_string(),
            reason: "response has no message content".to_string(),
        })
}

pub struct OpenAiAdapter {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiAdapter {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, TickerScoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TickerScoreError::Http {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
        })
    }

    fn request<'a>(&'a self, system_prompt: &'a str, user_prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: self.max_tokens,
        }
    }
}

impl SentimentModelPort for OpenAiAdapter {
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, TickerScoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request(system_prompt, user_prompt))
            .send()
            .map_err(|e| TickerScoreError::Http {
                url: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TickerScoreError::HttpStatus {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|e| TickerScoreError::Http {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        parse_completion(&body)
    }
}
