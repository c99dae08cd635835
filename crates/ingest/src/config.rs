//! Configuration for the ingestion pipeline.
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::default();
//! config.validate().expect("defaults are valid");
//! assert_eq!(config.max_excerpt_bytes, 64 * 1024);
//! ```
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid ingest config: {0}")]
pub struct ConfigError(pub String);

/// Runtime limits applied to every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Byte limit for title, author and source.
    ///
    /// Default: `1024`
    pub max_field_bytes: usize,

    /// Byte limit for the excerpt, measured after newline normalization.
    ///
    /// Default: `65536`
    pub max_excerpt_bytes: usize,

    /// Strip ASCII control characters (tabs and newlines in the excerpt are kept).
    ///
    /// Default: `true`
    pub strip_control_chars: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_field_bytes: 1024,
            max_excerpt_bytes: 64 * 1024,
            strip_control_chars: true,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_field_bytes == 0 || self.max_excerpt_bytes == 0 {
            return Err(ConfigError("field limits must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Upper bounds on the two external calls of an ingest.
///
/// Set by whoever owns the stage timeouts; not part of [`IngestConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestDeadlines {
    pub embed: Duration,
    pub insert: Duration,
}

impl Default for IngestDeadlines {
    fn default() -> Self {
        Self {
            embed: Duration::from_secs(15),
            insert: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limits_are_rejected() {
        let cfg = IngestConfig {
            max_field_bytes: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: IngestConfig = serde_json::from_str(r#"{"max_excerpt_bytes": 10}"#).unwrap();
        assert_eq!(cfg.max_excerpt_bytes, 10);
        assert_eq!(cfg.max_field_bytes, 1024);
        assert!(cfg.strip_control_chars);
    }
}
