use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use crate::normalize::l2_normalize_in_place;
use crate::vector::validate_embedding;
use crate::{EmbeddingGateway, SemanticConfig, SemanticEmbedding, SemanticError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

fn api_provider_kind(provider: Option<&str>) -> ApiProviderKind {
    match provider.unwrap_or("openai").to_ascii_lowercase().as_str() {
        "hf" | "huggingface" => ApiProviderKind::HuggingFace,
        "openai" | "gpt" => ApiProviderKind::OpenAI,
        _ => ApiProviderKind::Custom,
    }
}

/// Remote embedding gateway speaking the OpenAI, Hugging Face, or a
/// `{"text": ...}` custom protocol.
#[derive(Debug, Clone)]
pub struct ApiEmbedder {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    provider: ApiProviderKind,
    model_name: String,
    dimension: usize,
    normalize: bool,
}

impl ApiEmbedder {
    pub fn new(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let url = cfg
            .api_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                SemanticError::InvalidConfig("api_url is required for api mode".into())
            })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.api_timeout_secs.unwrap_or(30)))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url,
            auth_header: cfg.api_auth_header.clone(),
            provider: api_provider_kind(cfg.api_provider.as_deref()),
            model_name: cfg.model_name.clone(),
            dimension: cfg.dimension,
            normalize: cfg.normalize,
        })
    }

    fn build_payload(&self, text: &str) -> Value {
        match self.provider {
            ApiProviderKind::HuggingFace => json!({ "inputs": text }),
            ApiProviderKind::OpenAI => json!({ "input": text, "model": self.model_name }),
            ApiProviderKind::Custom => json!({ "text": text }),
        }
    }

    async fn send(&self, payload: Value) -> Result<Value, SemanticError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }

        let response = request.json(&payload).send().await.map_err(|e| {
            let retryable = e.is_timeout() || e.is_connect() || e.is_request();
            SemanticError::upstream(format!("HTTP request failed: {e}"), retryable)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::upstream(
                format!("HTTP error {status}: {}", truncate_body(&body)),
                status_is_retryable(status),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::upstream(format!("invalid JSON response: {e}"), false))
    }
}

#[async_trait]
impl EmbeddingGateway for ApiEmbedder {
    async fn embed(&self, text: &str) -> Result<SemanticEmbedding, SemanticError> {
        let response = self.send(self.build_payload(text)).await?;
        let raw = extract_embedding_value(response)?;
        let mut vector = validate_embedding(raw, self.dimension)?;
        if self.normalize {
            l2_normalize_in_place(&mut vector);
        }
        tracing::debug!(
            model = %self.model_name,
            dimension = self.dimension,
            "embedding received"
        );
        Ok(SemanticEmbedding {
            vector,
            model_name: self.model_name.clone(),
            embedding_dim: self.dimension,
            normalized: self.normalize,
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn status_is_retryable(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

fn truncate_body(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Pulls the first embedding out of the known response shapes without
/// interpreting its entries. Shape problems here mean the provider sent
/// something other than an embedding response, so they count as upstream
/// failures; entry-level problems are left to [`validate_embedding`].
fn extract_embedding_value(value: Value) -> Result<Value, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("data") {
                let first = items.into_iter().next().ok_or_else(|| {
                    SemanticError::upstream("empty `data` array in response", false)
                })?;
                return match first {
                    Value::Object(mut obj) => obj.remove("embedding").ok_or_else(|| {
                        SemanticError::upstream("missing `embedding` field in data item", false)
                    }),
                    _ => Err(SemanticError::upstream(
                        "unexpected entry inside `data` array",
                        false,
                    )),
                };
            }
            if let Some(embeddings) = map.remove("embeddings") {
                return first_of_collection(embeddings);
            }
            if let Some(embedding) = map.remove("embedding") {
                return Ok(embedding);
            }
            Err(SemanticError::upstream(
                "unsupported API response shape",
                false,
            ))
        }
        other => first_of_collection(other),
    }
}

fn first_of_collection(value: Value) -> Result<Value, SemanticError> {
    match value {
        Value::Array(items)
            if !items.is_empty() && items.iter().all(|i| matches!(i, Value::Array(_))) =>
        {
            Ok(items.into_iter().next().unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}
