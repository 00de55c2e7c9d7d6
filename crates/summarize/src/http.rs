//! Shared HTTP plumbing for the model backends

use crate::SummarizeError;
use serde::de::DeserializeOwned;

pub(crate) fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Send a JSON request and decode a successful JSON response
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, SummarizeError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SummarizeError::Status {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        });
    }
    Ok(response.json().await?)
}

/// Trimmed text, or `EmptyResponse` when there is none
pub(crate) fn non_empty(text: Option<String>) -> Result<String, SummarizeError> {
    match text.map(|t| t.trim().to_string()) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(SummarizeError::EmptyResponse),
    }
}
