use serde::{Deserialize, Serialize};

use crate::GenerationError;

/// How much of a candidate poem the writer may quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExcerptPolicy {
    /// Always quote the whole poem.
    FullText,
    /// Quote in full only when the poet died, or the poem was published,
    /// before `cutoff_year`; otherwise first stanza plus a disclosure.
    FirstStanzaWhenProtected { cutoff_year: i32 },
    /// Always quote only the first stanza plus a disclosure.
    FirstStanzaAlways,
}

impl Default for ExcerptPolicy {
    fn default() -> Self {
        ExcerptPolicy::FirstStanzaWhenProtected { cutoff_year: 1955 }
    }
}

/// Register of the explanation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Cute, warm, informal speech addressed straight to the reader.
    #[default]
    Playful,
    /// Warm, polite speech.
    Warm,
    /// Calm and plain.
    Plain,
}

/// Settings for the chat-completions writer and the vision captioner.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Chat completions endpoint, shared by writer and captioner.
    pub api_url: String,
    /// Authorization header value (e.g. `"Bearer sk-xxx"`).
    pub api_auth_header: Option<String>,
    /// Model that picks and re-renders the poem.
    pub model: String,
    pub temperature: f32,
    /// Vision model used to caption photos.
    pub caption_model: String,
    pub api_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub tone: Tone,
    pub excerpt_policy: ExcerptPolicy,
    /// Upper bound on quoted lines for a protected poem.
    pub max_excerpt_lines: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".into(),
            api_auth_header: None,
            model: "gpt-4o".into(),
            temperature: 0.3,
            caption_model: "gpt-4o-mini".into(),
            api_timeout_secs: 60,
            connect_timeout_secs: 10,
            tone: Tone::default(),
            excerpt_policy: ExcerptPolicy::default(),
            max_excerpt_lines: 5,
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_url", &self.api_url)
            .field(
                "api_auth_header",
                &self.api_auth_header.as_ref().map(|_| "<redacted>"),
            )
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("caption_model", &self.caption_model)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("tone", &self.tone)
            .field("excerpt_policy", &self.excerpt_policy)
            .field("max_excerpt_lines", &self.max_excerpt_lines)
            .finish()
    }
}

impl GenerationConfig {
    pub fn with_excerpt_policy(mut self, policy: ExcerptPolicy) -> Self {
        self.excerpt_policy = policy;
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.api_url.trim().is_empty() {
            return Err(GenerationError::InvalidConfig("api_url is empty".into()));
        }
        if self.model.trim().is_empty() || self.caption_model.trim().is_empty() {
            return Err(GenerationError::InvalidConfig("model names must be set".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GenerationError::InvalidConfig(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.max_excerpt_lines == 0 {
            return Err(GenerationError::InvalidConfig(
                "max_excerpt_lines must be greater than zero".into(),
            ));
        }
        if self.api_timeout_secs == 0 {
            return Err(GenerationError::InvalidConfig(
                "api_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = GenerationConfig::default();
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.caption_model, "gpt-4o-mini");
        assert!((cfg.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(
            cfg.excerpt_policy,
            ExcerptPolicy::FirstStanzaWhenProtected { cutoff_year: 1955 }
        );
        assert_eq!(cfg.max_excerpt_lines, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn policy_deserializes_from_tagged_form() {
        let p: ExcerptPolicy = serde_json::from_str(r#"{"mode":"full_text"}"#).unwrap();
        assert_eq!(p, ExcerptPolicy::FullText);
        let p: ExcerptPolicy =
            serde_json::from_str(r#"{"mode":"first_stanza_when_protected","cutoff_year":1950}"#)
                .unwrap();
        assert_eq!(p, ExcerptPolicy::FirstStanzaWhenProtected { cutoff_year: 1950 });
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let cfg = GenerationConfig {
            temperature: 3.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = GenerationConfig {
            max_excerpt_lines: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let cfg = GenerationConfig {
            api_auth_header: Some("Bearer sk-live".into()),
            ..Default::default()
        };
        assert!(!format!("{cfg:?}").contains("sk-live"));
    }
}
