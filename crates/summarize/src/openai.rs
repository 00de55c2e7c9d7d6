//! OpenAI-compatible chat completions (`/chat/completions`)

use crate::http::{client, non_empty, send_json};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::{api_key, or_default, SummarizeError, Summarizer};
use async_trait::async_trait;
use journal::Change;
use serde::Deserialize;
use serde_json::json;
use stake_core::config::SummarizerConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_KEY_ENV: &str = "OPENAI_API_KEY";

pub struct OpenAiSummarizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    max_files: usize,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl OpenAiSummarizer {
    /// Backend using the key from the configured environment variable
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
impl Summarizer for OpenAiSummarizer {
    async fn summarize(
        &self,
        changes: &[Change],
        intent: Option<&str>,
    ) -> Result<String, SummarizeError> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(changes, intent, self.max_files)},
            ],
        });

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);
        let response: CompletionResponse = send_json(request).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);
        non_empty(text)
    }

    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
