//! Natural-language summaries of pending changes
//!
//! This crate provides:
//! - `Summarizer`: one trait, one implementation per backend
//! - Commit-message prompt construction
//! - Offline, Ollama, OpenAI-compatible and Anthropic backends
//! - `summarize_bounded`: a summary call with a deadline

pub mod anthropic;
mod http;
pub mod offline;
pub mod ollama;
pub mod openai;
pub mod prompt;

pub use anthropic::AnthropicSummarizer;
pub use offline::OfflineSummarizer;
pub use ollama::OllamaSummarizer;
pub use openai::OpenAiSummarizer;

use async_trait::async_trait;
use journal::Change;
use stake_core::config::{SummarizerConfig, SummarizerProvider};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Backend returned no text")]
    EmptyResponse,

    #[error("No summary within {0:?}")]
    Timeout(Duration),
}

/// Produces a summary for a set of pending changes
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        changes: &[Change],
        intent: Option<&str>,
    ) -> Result<String, SummarizeError>;

    /// Backend name recorded in semantic history
    fn provider(&self) -> &str;

    fn model(&self) -> &str;
}

pub type SharedSummarizer = Arc<dyn Summarizer>;

/// Build the backend selected in configuration
pub fn build_summarizer(config: &SummarizerConfig) -> Result<SharedSummarizer, SummarizeError> {
    let summarizer: SharedSummarizer = match config.provider {
        SummarizerProvider::Offline => Arc::new(OfflineSummarizer::new(config.max_files)),
        SummarizerProvider::Ollama => Arc::new(OllamaSummarizer::from_config(config)?),
        SummarizerProvider::OpenAi => Arc::new(OpenAiSummarizer::from_config(config)?),
        SummarizerProvider::Anthropic => Arc::new(AnthropicSummarizer::from_config(config)?),
    };
    tracing::debug!(
        provider = summarizer.provider(),
        model = summarizer.model(),
        "Summarizer ready"
    );
    Ok(summarizer)
}

/// Call `summarizer`, giving up after `timeout`
pub async fn summarize_bounded(
    summarizer: &dyn Summarizer,
    changes: &[Change],
    intent: Option<&str>,
    timeout: Duration,
) -> Result<String, SummarizeError> {
    match tokio::time::timeout(timeout, summarizer.summarize(changes, intent)).await {
        Ok(result) => result,
        Err(_) => Err(SummarizeError::Timeout(timeout)),
    }
}

/// Resolve an API key from the configured (or default) environment variable
pub(crate) fn api_key(config: &SummarizerConfig, default_env: &str) -> Result<String, SummarizeError> {
    let var = config.api_key_env.as_deref().unwrap_or(default_env);
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(SummarizeError::MissingApiKey(var.to_string())),
    }
}

/// Configured value, or `default` when left empty
pub(crate) fn or_default(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.trim_end_matches('/').to_string()
    }
}
