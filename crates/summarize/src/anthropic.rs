//! Anthropic Messages API (`/v1/messages`)

use crate::http::{client, non_empty, send_json};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::{api_key, or_default, SummarizeError, Summarizer};
use async_trait::async_trait;
use journal::Change;
use serde::Deserialize;
use serde_json::json;
use stake_core::config::SummarizerConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
pub const DEFAULT_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicSummarizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    max_files: usize,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl AnthropicSummarizer {
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        let key = api_key(config, DEFAULT_KEY_ENV)?;
        Ok(Self::with_key(config, key))
    }

    pub fn with_key(config: &SummarizerConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: client(),
            base_url: or_default(&config.base_url, DEFAULT_BASE_URL),
            model: or_default(&config.model, DEFAULT_MODEL),
            api_key: api_key.into(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_files: config.max_files,
        }
    }
}

#[async_trait]
impl Summarizer for AnthropicSummarizer {
    async fn summarize(
        &self,
        changes: &[Change],
        intent: Option<&str>,
    ) -> Result<String, SummarizeError> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "system": SYSTEM_PROMPT,
            "messages": [
                {"role": "user", "content": build_prompt(changes, intent, self.max_files)},
            ],
        });

        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);
        let response: MessagesResponse = send_json(request).await?;

        let text: Vec<String> = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        non_empty(Some(text.join("\n")))
    }

    fn provider(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
