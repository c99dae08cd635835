//! Photopoem ingest layer
//!
//! This is where poems enter the corpus. A submission is validated and
//! normalized, its excerpt is embedded, and the resulting record is written to
//! the vector index.
//!
//! ## What we do here
//!
//! - **Validate fields** - title, author, excerpt and source are required and
//!   trimmed; control characters are stripped; byte limits are enforced
//! - **Embed the excerpt** - through whatever [`EmbeddingGateway`] is wired in,
//!   once more if the vector comes back malformed
//! - **Insert** - the index assigns the id and returns the stored record
//! - **Bound both calls** - each runs under its [`IngestDeadlines`] entry
//! - **Log everything** - structured `ingest_success` / `ingest_failure` events
//!
//! Validation happens before any external call. A failed submission never
//! reaches the index. Repeated ingestion of the same poem creates duplicates.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use index::{InMemoryIndex, VectorIndex};
//! use ingest::{IngestConfig, IngestionPipeline};
//! use semantic::StubEmbedder;
//!
//! # #[tokio::main]
//! # async fn main() {
//!     let index = Arc::new(InMemoryIndex::new(8));
//!     let pipeline = IngestionPipeline::new(
//!         Arc::new(StubEmbedder::new(8)),
//!         index.clone(),
//!         IngestConfig::default(),
//!     );
//!     let record = pipeline
//!         .ingest("서시", "윤동주", "죽는 날까지 하늘을 우러러", "1948")
//!         .await
//!         .unwrap();
//!     assert_eq!(record.title, "서시");
//!     assert_eq!(index.len().await.unwrap(), 1);
//! # }
//! ```
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use index::{NewPoem, PoemRecord, VectorIndex};
use semantic::{EmbeddingGateway, SemanticEmbedding, SemanticError};
use tracing::{debug, info, warn, Instrument, Level};

mod config;
mod error;
mod types;

pub use crate::config::{ConfigError, IngestConfig, IngestDeadlines};
pub use crate::error::{IngestError, IngestStage};
pub use crate::types::PoemSubmission;

/// Embeds and stores new corpus items.
#[derive(Clone)]
pub struct IngestionPipeline {
    gateway: Arc<dyn EmbeddingGateway>,
    index: Arc<dyn VectorIndex>,
    cfg: IngestConfig,
    deadlines: IngestDeadlines,
}

/// Outcome of [`IngestionPipeline::ingest_batch`].
///
/// `failure` carries the position of the first rejected submission; nothing
/// after it was attempted.
#[derive(Debug)]
pub struct BatchOutcome {
    pub created: Vec<PoemRecord>,
    pub failure: Option<(usize, IngestError)>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

impl IngestionPipeline {
    pub fn new(
        gateway: Arc<dyn EmbeddingGateway>,
        index: Arc<dyn VectorIndex>,
        cfg: IngestConfig,
    ) -> Self {
        Self {
            gateway,
            index,
            cfg,
            deadlines: IngestDeadlines::default(),
        }
    }

    pub fn with_deadlines(mut self, deadlines: IngestDeadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.cfg
    }

    pub fn deadlines(&self) -> IngestDeadlines {
        self.deadlines
    }

    /// Validate, embed and store one poem.
    pub async fn ingest(
        &self,
        title: &str,
        author: &str,
        excerpt: &str,
        source: &str,
    ) -> Result<PoemRecord, IngestError> {
        self.ingest_submission(PoemSubmission::new(title, author, excerpt, source))
            .await
    }

    pub async fn ingest_submission(
        &self,
        submission: PoemSubmission,
    ) -> Result<PoemRecord, IngestError> {
        let span = tracing::span!(Level::INFO, "ingest.ingest", title = %submission.title);
        let start = Instant::now();

        let result = self.run(submission).instrument(span.clone()).await;
        let elapsed_micros = start.elapsed().as_micros() as u64;

        let _guard = span.enter();
        match &result {
            Ok(record) => info!(
                poem_id = %record.id,
                excerpt_bytes = record.excerpt.len(),
                elapsed_micros,
                "ingest_success"
            ),
            Err(err) => warn!(
                error = %err,
                validation = err.is_validation(),
                elapsed_micros,
                "ingest_failure"
            ),
        }
        result
    }

    /// Ingest sequentially, stopping at the first failure.
    pub async fn ingest_batch<I>(&self, submissions: I) -> BatchOutcome
    where
        I: IntoIterator<Item = PoemSubmission>,
    {
        let mut created = Vec::new();
        for (position, submission) in submissions.into_iter().enumerate() {
            match self.ingest_submission(submission).await {
                Ok(record) => created.push(record),
                Err(err) => {
                    return BatchOutcome {
                        created,
                        failure: Some((position, err)),
                    }
                }
            }
        }
        BatchOutcome {
            created,
            failure: None,
        }
    }

    async fn run(&self, submission: PoemSubmission) -> Result<PoemRecord, IngestError> {
        let PoemSubmission {
            title,
            author,
            excerpt,
            source,
        } = submission.normalize(&self.cfg)?;

        let embedding = self.embed_excerpt(&excerpt).await?;
        debug!(
            model = %embedding.model_name,
            dim = embedding.embedding_dim,
            "excerpt_embedded"
        );

        let poem = NewPoem {
            title,
            author,
            excerpt,
            source,
            embedding: embedding.into_vector(),
        };
        let record = bounded(
            IngestStage::Insert,
            self.deadlines.insert,
            self.index.insert(poem),
        )
        .await?;
        Ok(record)
    }

    /// A malformed vector is re-requested once before giving up.
    async fn embed_excerpt(&self, excerpt: &str) -> Result<SemanticEmbedding, IngestError> {
        let deadline = self.deadlines.embed;
        match bounded(IngestStage::Embed, deadline, self.gateway.embed(excerpt)).await {
            Err(IngestError::Embedding(SemanticError::Format(detail))) => {
                warn!(detail = %detail, "embedding malformed, re-embedding once");
                bounded(IngestStage::Embed, deadline, self.gateway.embed(excerpt)).await
            }
            other => other,
        }
    }
}

async fn bounded<T, E, F>(stage: IngestStage, after: Duration, fut: F) -> Result<T, IngestError>
where
    F: Future<Output = Result<T, E>>,
    IngestError: From<E>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result.map_err(IngestError::from),
        Err(_) => Err(IngestError::Timeout { stage, after }),
    }
}
