//! Local Ollama server (`/api/chat`)

use crate::http::{client, non_empty, send_json};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::{or_default, SummarizeError, Summarizer};
use async_trait::async_trait;
use journal::Change;
use serde::Deserialize;
use serde_json::json;
use stake_core::config::SummarizerConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "qwen3-coder:30b";

pub struct OllamaSummarizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_files: usize,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OllamaSummarizer {
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        Ok(Self {
            client: client(),
            base_url: or_default(&config.base_url, DEFAULT_BASE_URL),
            model: or_default(&config.model, DEFAULT_MODEL),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_files: config.max_files,
        })
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(
        &self,
        changes: &[Change],
        intent: Option<&str>,
    ) -> Result<String, SummarizeError> {
        let body = json!({
            "model": self.model,
            "stream": false,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(changes, intent, self.max_files)},
            ],
            "options": {
                "temperature": self.temperature,
                "num_predict": self.max_tokens,
            },
        });

        let request = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body);
        let response: ChatResponse = send_json(request).await?;
        non_empty(response.message.and_then(|m| m.content))
    }

    fn provider(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
