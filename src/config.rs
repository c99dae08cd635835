//! Layered configuration for the whole pipeline.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. a YAML file (`photopoem.yaml` in the working directory, or an explicit path)
//! 3. environment variables prefixed `PHOTOPOEM__`, sections separated by `__`
//!
//! ## Example
//!
//! ```yaml
//! log_level: "info"
//! log_format: "json"
//!
//! semantic:
//!   mode: "api"
//!   model_name: "text-embedding-3-small"
//!   dimension: 1536
//!
//! index:
//!   dimension: 1536
//!   backend:
//!     kind: "postgres"
//!     url: "postgres://poems@localhost/poems"
//!
//! generation:
//!   model: "gpt-4o"
//!   temperature: 0.3
//!   excerpt_policy:
//!     mode: "first_stanza_when_protected"
//!     cutoff_year: 1955
//!
//! pipeline:
//!   top_k: 3
//!   max_contract_retries: 2
//!   timeouts:
//!     embed: 15000
//!     generate: 60s
//!     insert: 5000
//! ```
//!
//! Secrets are usually supplied through the environment, for example
//! `PHOTOPOEM__SEMANTIC__API_AUTH_HEADER="Bearer sk-..."`.

use std::path::Path;
use std::time::Duration;

use contract::ContractConfig;
use generation::GenerationConfig;
use index::IndexConfig;
use ingest::IngestConfig;
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryConfig;

pub const DEFAULT_CONFIG_FILE: &str = "photopoem";
pub const ENV_PREFIX: &str = "PHOTOPOEM";
const MAX_CONTRACT_RETRIES: u32 = 5;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Per-stage deadlines, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTimeouts {
    #[serde(with = "crate::serde_millis")]
    pub caption: Duration,
    #[serde(with = "crate::serde_millis")]
    pub embed: Duration,
    #[serde(with = "crate::serde_millis")]
    pub search: Duration,
    #[serde(with = "crate::serde_millis")]
    pub generate: Duration,
    /// Index insert during ingestion.
    #[serde(with = "crate::serde_millis")]
    pub insert: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            caption: Duration::from_secs(30),
            embed: Duration::from_secs(15),
            search: Duration::from_secs(5),
            generate: Duration::from_secs(60),
            insert: Duration::from_secs(5),
        }
    }
}

impl StageTimeouts {
    /// Same deadline for every stage.
    pub fn uniform(deadline: Duration) -> Self {
        Self {
            caption: deadline,
            embed: deadline,
            search: deadline,
            generate: deadline,
            insert: deadline,
        }
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Candidates retrieved per query.
    ///
    /// Default: `3`
    pub top_k: usize,

    /// Extra generation attempts after a contract violation.
    ///
    /// Default: `2`
    pub max_contract_retries: u32,

    /// Return raw text flagged `well_formed = false` once contract retries are
    /// spent. When false the request fails with `CONTRACT_VIOLATION` instead.
    /// Identity leaks are never degraded.
    ///
    /// Default: `true`
    pub degrade_on_violation: bool,

    pub timeouts: StageTimeouts,

    /// Backoff for transient caption, embed and generate failures.
    pub upstream_retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_contract_retries: 2,
            degrade_on_violation: true,
            timeouts: StageTimeouts::default(),
            upstream_retry: RetryConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_contract_retries(mut self, retries: u32) -> Self {
        self.max_contract_retries = retries;
        self
    }

    pub fn with_degrade_on_violation(mut self, degrade: bool) -> Self {
        self.degrade_on_violation = degrade;
        self
    }

    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_upstream_retry(mut self, retry: RetryConfig) -> Self {
        self.upstream_retry = retry;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.top_k == 0 {
            return Err(ConfigLoadError::Validation(
                "pipeline.top_k must be greater than zero".into(),
            ));
        }
        if self.max_contract_retries > MAX_CONTRACT_RETRIES {
            return Err(ConfigLoadError::Validation(format!(
                "pipeline.max_contract_retries must be at most {MAX_CONTRACT_RETRIES}"
            )));
        }
        let t = &self.timeouts;
        for (name, deadline) in [
            ("caption", t.caption),
            ("embed", t.embed),
            ("search", t.search),
            ("generate", t.generate),
            ("insert", t.insert),
        ] {
            if deadline.is_zero() {
                return Err(ConfigLoadError::Validation(format!(
                    "pipeline.timeouts.{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotopoemConfig {
    pub semantic: SemanticConfig,
    pub index: IndexConfig,
    pub generation: GenerationConfig,
    pub contract: ContractConfig,
    pub ingest: IngestConfig,
    pub pipeline: PipelineConfig,
    /// Default tracing filter; `RUST_LOG` overrides it.
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for PhotopoemConfig {
    fn default() -> Self {
        Self {
            semantic: SemanticConfig::default(),
            index: IndexConfig::default(),
            generation: GenerationConfig::default(),
            contract: ContractConfig::default(),
            ingest: IngestConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl PhotopoemConfig {
    /// Offline configuration: stub embedder and in-memory index of `dimension`.
    pub fn offline(dimension: usize) -> Self {
        Self {
            semantic: SemanticConfig::stub(dimension),
            index: IndexConfig::new(dimension),
            ..Self::default()
        }
    }

    /// Load defaults, then the YAML file, then `PHOTOPOEM__*` variables.
    ///
    /// Without `path`, `photopoem.yaml` is read from the working directory if
    /// present. An explicit `path` must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let builder = config::Config::builder().add_source(file).add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let cfg: PhotopoemConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks every section and the invariants that span sections.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        self.semantic.validate().map_err(invalid)?;
        self.index.validate().map_err(invalid)?;
        self.generation.validate().map_err(invalid)?;
        self.contract.validate().map_err(invalid)?;
        self.ingest.validate().map_err(invalid)?;
        self.pipeline.validate()?;

        if self.semantic.dimension == 0 {
            return Err(ConfigLoadError::Validation(
                "semantic.dimension must be greater than zero".into(),
            ));
        }
        if self.semantic.dimension != self.index.dimension {
            return Err(ConfigLoadError::Validation(format!(
                "semantic.dimension ({}) must equal index.dimension ({})",
                self.semantic.dimension, self.index.dimension
            )));
        }
        Ok(())
    }
}

fn invalid<E: std::fmt::Display>(err: E) -> ConfigLoadError {
    ConfigLoadError::Validation(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let cfg = PhotopoemConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.pipeline.top_k, 3);
        assert_eq!(cfg.pipeline.max_contract_retries, 2);
        assert_eq!(cfg.pipeline.upstream_retry.max_retries, 2);
        assert_eq!(cfg.semantic.dimension, cfg.index.dimension);
    }

    #[test]
    fn offline_config_is_valid() {
        let cfg = PhotopoemConfig::offline(32);
        cfg.validate().unwrap();
        assert_eq!(cfg.index.dimension, 32);
    }

    #[test]
    fn dimension_skew_is_rejected() {
        let mut cfg = PhotopoemConfig::offline(32);
        cfg.index.dimension = 16;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("must equal index.dimension"));
    }

    #[test]
    fn pipeline_bounds_are_enforced() {
        assert!(PipelineConfig::default().with_top_k(0).validate().is_err());
        assert!(PipelineConfig::default()
            .with_max_contract_retries(6)
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_timeouts(StageTimeouts {
                search: Duration::ZERO,
                ..StageTimeouts::default()
            })
            .validate()
            .is_err());
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "log_format: json\n\
             semantic:\n  mode: fast\n  model_name: stub\n  dimension: 8\n\
             index:\n  dimension: 8\n\
             pipeline:\n  top_k: 5\n  timeouts:\n    embed: 2500\n    insert: 2s\n"
        )
        .unwrap();

        let cfg = PhotopoemConfig::load(Some(file.path())).unwrap();

        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.semantic.dimension, 8);
        assert_eq!(cfg.pipeline.top_k, 5);
        assert_eq!(cfg.pipeline.timeouts.embed, Duration::from_millis(2500));
        assert_eq!(cfg.pipeline.timeouts.insert, Duration::from_secs(2));
        assert_eq!(cfg.pipeline.timeouts.generate, Duration::from_secs(60));
        assert_eq!(cfg.pipeline.max_contract_retries, 2);
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "pipeline:\n  max_contract_retries: 9\n").unwrap();

        let err = PhotopoemConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = PhotopoemConfig::load(Some(Path::new("/nonexistent/photopoem.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Source(_)));
    }
}
