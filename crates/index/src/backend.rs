use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{InMemoryIndex, IndexError, NewPoem, PoemRecord, SimilarityResult};

/// Append-only store of poems that answers nearest-neighbour queries.
///
/// Implementations are shared across requests behind an `Arc`; readers never
/// block each other and inserts are independent appends.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Dimension every stored and queried vector must have.
    fn dimension(&self) -> usize;

    /// Stores `poem` and returns it with its assigned id.
    ///
    /// Fails with [`IndexError::DimensionMismatch`] if the embedding length is wrong.
    async fn insert(&self, poem: NewPoem) -> Result<PoemRecord, IndexError>;

    /// Up to `k` records, closest first.
    ///
    /// Fails with [`IndexError::EmptyIndex`] when nothing is stored.
    async fn search(&self, query: &[f32], k: usize) -> Result<SimilarityResult, IndexError>;

    async fn len(&self) -> Result<usize, IndexError>;

    async fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len().await? == 0)
    }

    /// Releases connections. Called once at shutdown.
    async fn close(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// Configuration for selecting and building a backend.
///
/// # Example
/// ```
/// use index::BackendConfig;
///
/// let memory = BackendConfig::in_memory();
/// let pg = BackendConfig::postgres("postgres://localhost/poems");
/// assert!(matches!(pg, BackendConfig::Postgres { .. }));
/// # let _ = memory;
/// ```
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Process-local storage. Used by tests and the offline demo.
    #[default]
    InMemory,
    /// PostgreSQL with the pgvector extension.
    ///
    /// Requires the `backend-postgres` feature (enabled by default).
    Postgres {
        url: String,
        #[serde(default = "default_table")]
        table: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Create the extension and table on open if missing.
        #[serde(default = "default_ensure_schema")]
        ensure_schema: bool,
    },
}

fn default_table() -> String {
    "poems".into()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_ensure_schema() -> bool {
    true
}

// Connection URLs usually carry a password.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::InMemory => f.write_str("InMemory"),
            BackendConfig::Postgres {
                table,
                max_connections,
                ensure_schema,
                ..
            } => f
                .debug_struct("Postgres")
                .field("url", &"<redacted>")
                .field("table", table)
                .field("max_connections", max_connections)
                .field("ensure_schema", ensure_schema)
                .finish(),
        }
    }
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn postgres<U: Into<String>>(url: U) -> Self {
        BackendConfig::Postgres {
            url: url.into(),
            table: default_table(),
            max_connections: default_max_connections(),
            ensure_schema: default_ensure_schema(),
        }
    }
}

/// Index settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Must equal the embedding gateway's dimension.
    pub dimension: usize,
    pub backend: BackendConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dimension: 1536,
            backend: BackendConfig::default(),
        }
    }
}

impl IndexConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.dimension == 0 {
            return Err(IndexError::InvalidConfig(
                "dimension must be greater than zero".into(),
            ));
        }
        if let BackendConfig::Postgres {
            url,
            table,
            max_connections,
            ..
        } = &self.backend
        {
            if url.trim().is_empty() {
                return Err(IndexError::InvalidConfig("postgres url is empty".into()));
            }
            if *max_connections == 0 {
                return Err(IndexError::InvalidConfig(
                    "max_connections must be greater than zero".into(),
                ));
            }
            crate::validate_table_name(table)?;
        }
        Ok(())
    }
}

/// Opens the configured backend. Call once at startup and share the handle.
pub async fn open_index(cfg: &IndexConfig) -> Result<Arc<dyn VectorIndex>, IndexError> {
    cfg.validate()?;
    match &cfg.backend {
        BackendConfig::InMemory => {
            tracing::info!(dimension = cfg.dimension, "opening in-memory index");
            Ok(Arc::new(InMemoryIndex::new(cfg.dimension)))
        }
        BackendConfig::Postgres {
            url,
            table,
            max_connections,
            ensure_schema,
        } => {
            #[cfg(feature = "backend-postgres")]
            {
                tracing::info!(dimension = cfg.dimension, table = %table, "opening pgvector index");
                let index = crate::PgVectorIndex::connect(
                    url,
                    table,
                    *max_connections,
                    cfg.dimension,
                )
                .await?;
                if *ensure_schema {
                    index.ensure_schema().await?;
                }
                Ok(Arc::new(index))
            }
            #[cfg(not(feature = "backend-postgres"))]
            {
                let _ = (url, table, max_connections, ensure_schema);
                Err(IndexError::InvalidConfig(
                    "postgres backend disabled at compile time".into(),
                ))
            }
        }
    }
}
