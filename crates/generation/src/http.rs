use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use crate::{GenerationConfig, GenerationError};

/// Minimal chat-completions client shared by the writer and the captioner.
#[derive(Debug, Clone)]
pub(crate) struct ChatClient {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
}

impl ChatClient {
    pub(crate) fn new(cfg: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.api_timeout_secs))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .build()
            .map_err(|e| GenerationError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: cfg.api_url.clone(),
            auth_header: cfg.api_auth_header.clone(),
        })
    }

    /// Posts `payload` and returns `choices[0].message.content`.
    pub(crate) async fn complete(&self, payload: &Value) -> Result<String, GenerationError> {
        let mut request = self.client.post(&self.url);
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }

        let response = request.json(payload).send().await.map_err(|e| {
            let retryable = e.is_timeout() || e.is_connect() || e.is_request();
            GenerationError::upstream(format!("HTTP request failed: {e}"), retryable)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::upstream(
                format!("HTTP error {status}"),
                status_is_retryable(status),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::upstream(format!("invalid JSON response: {e}"), false))?;
        extract_content(&body)
    }
}

pub(crate) fn status_is_retryable(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

pub(crate) fn extract_content(body: &Value) -> Result<String, GenerationError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            GenerationError::upstream("response missing choices[0].message.content", false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_choice() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "서시\n윤동주"}}]});
        assert_eq!(extract_content(&body).unwrap(), "서시\n윤동주");
    }

    #[test]
    fn missing_content_is_non_retryable_upstream() {
        let err = extract_content(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, GenerationError::Upstream { retryable: false, .. }));
        let err = extract_content(&json!({"choices": [{"message": {"content": null}}]})).unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn retryable_statuses() {
        assert!(status_is_retryable(StatusCode::BAD_GATEWAY));
        assert!(status_is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!status_is_retryable(StatusCode::FORBIDDEN));
        assert!(!status_is_retryable(StatusCode::NOT_FOUND));
    }
}
