//! Workspace umbrella crate for photopoem.
//!
//! A photo caption, a short story and a mood tag go in; one poem from the
//! corpus comes out, quoted verbatim with a short explanation of why it fits.
//!
//! ```text
//! QuerySignals ─► fuse ─► embed ─► index.search(k) ─► CandidateSelector ─► OutputContractValidator
//!                                                        ▲        │ violation (bounded retries)
//!                                                        └────────┘
//! ```
//!
//! [`Recommender`] runs that pipeline with a deadline per stage, retries
//! transient upstream failures with backoff, and either returns a validated
//! [`RecommendationResponse`], a degraded raw-text [`Recommendation`], or a
//! [`PipelineError`] with a client-safe message. Poems enter the corpus
//! through [`IngestionPipeline`].
//!
//! Everything behind a network boundary is a trait object
//! ([`EmbeddingGateway`], [`VectorIndex`], [`PoemWriter`], [`Captioner`]) so the
//! whole pipeline runs offline against [`StubEmbedder`], [`InMemoryIndex`] and
//! a scripted writer.

mod config;
mod error;
mod recommender;
pub mod retry;
mod serde_millis;

pub use crate::config::{
    ConfigLoadError, LogFormat, PhotopoemConfig, PipelineConfig, StageTimeouts,
    DEFAULT_CONFIG_FILE, ENV_PREFIX,
};
pub use crate::error::{ErrorKind, PipelineError, Stage};
pub use crate::recommender::{CandidateSummary, Recommendation, RecommendRequest, Recommender};
pub use crate::retry::RetryConfig;

pub use contract::{
    ContractConfig, ContractViolation, OutputContractValidator, RecommendationResponse,
    ViolationKind,
};
pub use fusion::{fuse, CompositeQuery, FusionError, QuerySignals};
pub use generation::{
    CandidateSelector, Captioner, ChatCompletionsWriter, ChatMessage, ExcerptPolicy,
    GenerationConfig, GenerationError, PoemWriter, RawGenerationOutput, Role, Tone,
    VisionCaptioner,
};
pub use index::{
    open_index, BackendConfig, InMemoryIndex, IndexConfig, IndexError, NewPoem, PoemId,
    PoemRecord, ScoredPoem, SimilarityResult, VectorIndex,
};
pub use ingest::{
    BatchOutcome, IngestConfig, IngestDeadlines, IngestError, IngestStage, IngestionPipeline,
    PoemSubmission,
};
pub use semantic::{
    build_gateway, EmbeddingGateway, SemanticConfig, SemanticEmbedding, SemanticError,
    StubEmbedder,
};
