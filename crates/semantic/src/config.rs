use serde::{Deserialize, Serialize};

use crate::SemanticError;

/// Runtime configuration for the embedding gateway.
///
/// # Example
/// ```
/// use semantic::SemanticConfig;
///
/// let cfg = SemanticConfig {
///     mode: "api".into(),
///     api_url: Some("https://api.openai.com/v1/embeddings".into()),
///     api_auth_header: Some("Bearer sk-xxx".into()),
///     api_provider: Some("openai".into()),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// `"api"` (remote HTTP) or `"fast"` (deterministic stub).
    pub mode: String,
    /// Model name sent to the provider and reported on every embedding.
    pub model_name: String,
    /// Embedding dimension every vector must have.
    pub dimension: usize,
    /// Endpoint used when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header value (e.g. `"Bearer sk-xxx"`).
    pub api_auth_header: Option<String>,
    /// Provider hint: `"openai"` (default), `"hf"`, or `"custom"`.
    pub api_provider: Option<String>,
    /// Overall HTTP timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// L2-normalize vectors before returning them.
    pub normalize: bool,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "api".into(),
            model_name: "text-embedding-3-small".into(),
            dimension: 1536,
            api_url: Some("https://api.openai.com/v1/embeddings".into()),
            api_auth_header: None,
            api_provider: Some("openai".into()),
            api_timeout_secs: Some(30),
            connect_timeout_secs: 10,
            normalize: true,
        }
    }
}

// Keeps the auth header out of logs.
impl std::fmt::Debug for SemanticConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticConfig")
            .field("mode", &self.mode)
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("api_url", &self.api_url)
            .field(
                "api_auth_header",
                &self.api_auth_header.as_ref().map(|_| "<redacted>"),
            )
            .field("api_provider", &self.api_provider)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("normalize", &self.normalize)
            .finish()
    }
}

impl SemanticConfig {
    /// Convenience constructor for the deterministic stub gateway.
    pub fn stub(dimension: usize) -> Self {
        Self {
            mode: "fast".into(),
            model_name: "stub".into(),
            dimension,
            api_url: None,
            api_provider: None,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), SemanticError> {
        if self.dimension == 0 {
            return Err(SemanticError::InvalidConfig(
                "dimension must be greater than zero".into(),
            ));
        }
        match self.mode.to_ascii_lowercase().as_str() {
            "fast" | "stub" => Ok(()),
            "api" => match self.api_url.as_deref() {
                Some(url) if !url.trim().is_empty() => Ok(()),
                _ => Err(SemanticError::InvalidConfig(
                    "api_url is required for api mode".into(),
                )),
            },
            other => Err(SemanticError::InvalidConfig(format!(
                "unknown embedding mode `{other}` (expected `api` or `fast`)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = SemanticConfig::default();
        assert_eq!(cfg.mode, "api");
        assert_eq!(cfg.model_name, "text-embedding-3-small");
        assert_eq!(cfg.dimension, 1536);
        assert_eq!(cfg.api_provider.as_deref(), Some("openai"));
        assert_eq!(cfg.api_timeout_secs, Some(30));
        assert!(cfg.normalize);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn stub_config_needs_no_endpoint() {
        let cfg = SemanticConfig::stub(16);
        assert_eq!(cfg.mode, "fast");
        assert!(cfg.api_url.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn api_mode_without_url_is_rejected() {
        let cfg = SemanticConfig {
            api_url: None,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SemanticError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_dimension_and_unknown_mode_are_rejected() {
        let zero = SemanticConfig::stub(0);
        assert!(zero.validate().is_err());

        let onnx = SemanticConfig {
            mode: "onnx".into(),
            ..Default::default()
        };
        let err = onnx.validate().unwrap_err();
        assert!(err.to_string().contains("onnx"));
    }

    #[test]
    fn debug_redacts_auth_header() {
        let cfg = SemanticConfig {
            api_auth_header: Some("Bearer secret-token".into()),
            ..Default::default()
        };
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn config_serde_roundtrip_with_partial_input() {
        let cfg: SemanticConfig =
            serde_json::from_str(r#"{"mode":"fast","dimension":8}"#).unwrap();
        assert_eq!(cfg.mode, "fast");
        assert_eq!(cfg.dimension, 8);
        assert_eq!(cfg.model_name, "text-embedding-3-small");
    }
}
