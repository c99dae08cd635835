use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contract::{ContractViolation, OutputContractValidator, RecommendationResponse, ViolationKind};
use fusion::{fuse, QuerySignals};
use generation::{
    CandidateSelector, Captioner, ChatCompletionsWriter, PoemWriter, RawGenerationOutput,
    VisionCaptioner,
};
use index::{PoemId, PoemRecord, ScoredPoem, VectorIndex};
use ingest::{IngestDeadlines, IngestionPipeline, PoemSubmission};
use semantic::{EmbeddingGateway, SemanticError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn, Instrument, Level};

use crate::retry::execute_with_retry_async;
use crate::{PhotopoemConfig, PipelineConfig, PipelineError, Stage};

/// One recommendation request as received from a client.
///
/// `caption` wins over `image_url`; the image is only captioned when no
/// caption was supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendRequest {
    pub image_url: Option<String>,
    pub caption: Option<String>,
    pub free_text: Option<String>,
    pub mood_tag: Option<String>,
}

/// A retrieved candidate, without its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: PoemId,
    pub title: String,
    pub author: String,
    pub distance: f32,
}

impl From<&ScoredPoem> for CandidateSummary {
    fn from(hit: &ScoredPoem) -> Self {
        Self {
            id: hit.record.id,
            title: hit.record.title.clone(),
            author: hit.record.author.clone(),
            distance: hit.distance,
        }
    }
}

/// Result of [`Recommender::recommend`].
///
/// When `well_formed` is false the writer never produced contract-conforming
/// text; `response` is `None`, `violation` names the last failure and
/// `raw_text` is the last output as generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub well_formed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<RecommendationResponse>,
    pub raw_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<ViolationKind>,
    /// Generation attempts, including the accepted one.
    pub attempts: u32,
    pub candidates: Vec<CandidateSummary>,
}

/// The query-time pipeline: fuse, embed, search, select, validate.
///
/// Holds one shared index handle for its whole lifetime; call
/// [`close`](Self::close) at shutdown.
#[derive(Clone)]
pub struct Recommender {
    gateway: Arc<dyn EmbeddingGateway>,
    index: Arc<dyn VectorIndex>,
    selector: CandidateSelector,
    validator: OutputContractValidator,
    ingestion: IngestionPipeline,
    captioner: Option<Arc<dyn Captioner>>,
    cfg: PipelineConfig,
}

impl Recommender {
    /// Wires the pipeline from already-built collaborators.
    ///
    /// Fails when the configuration is invalid or the gateway and the index
    /// disagree on vector dimension.
    pub fn new(
        gateway: Arc<dyn EmbeddingGateway>,
        index: Arc<dyn VectorIndex>,
        writer: Arc<dyn PoemWriter>,
        cfg: &PhotopoemConfig,
    ) -> Result<Self, PipelineError> {
        cfg.pipeline
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        if gateway.dimension() != index.dimension() {
            return Err(PipelineError::Config(format!(
                "embedding dimension {} does not match index dimension {}",
                gateway.dimension(),
                index.dimension()
            )));
        }
        let validator = OutputContractValidator::new(&cfg.contract)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let selector = CandidateSelector::new(writer, cfg.generation.clone());
        let ingestion = IngestionPipeline::new(gateway.clone(), index.clone(), cfg.ingest.clone())
            .with_deadlines(IngestDeadlines {
                embed: cfg.pipeline.timeouts.embed,
                insert: cfg.pipeline.timeouts.insert,
            });

        Ok(Self {
            gateway,
            index,
            selector,
            validator,
            ingestion,
            captioner: None,
            cfg: cfg.pipeline.clone(),
        })
    }

    /// Builds every collaborator from configuration and opens the index.
    pub async fn from_config(cfg: &PhotopoemConfig) -> Result<Self, PipelineError> {
        cfg.validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let gateway = semantic::build_gateway(&cfg.semantic)?;
        let index = index::open_index(&cfg.index).await?;
        let writer = Arc::new(ChatCompletionsWriter::new(&cfg.generation)?);
        let captioner = Arc::new(VisionCaptioner::new(&cfg.generation)?);
        Ok(Self::new(gateway, index, writer, cfg)?.with_captioner(captioner))
    }

    pub fn with_captioner(mut self, captioner: Arc<dyn Captioner>) -> Self {
        self.captioner = Some(captioner);
        self
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn ingestion(&self) -> &IngestionPipeline {
        &self.ingestion
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Caption the image if needed, then [`recommend`](Self::recommend).
    pub async fn recommend_request(
        &self,
        request: RecommendRequest,
    ) -> Result<Recommendation, PipelineError> {
        let RecommendRequest {
            image_url,
            caption,
            free_text,
            mood_tag,
        } = request;
        let mut signals = QuerySignals {
            image_caption: caption,
            free_text,
            mood_tag,
        };

        let image_url = image_url
            .filter(|url| !url.trim().is_empty())
            .filter(|_| signals.caption().is_none());
        if let Some(url) = image_url {
            match &self.captioner {
                Some(captioner) => {
                    let caption = self.caption(captioner.as_ref(), url.trim()).await?;
                    signals.image_caption = Some(caption);
                }
                None if signals.is_empty() => {
                    return Err(PipelineError::InvalidSignals(
                        "image captioning is not configured".into(),
                    ))
                }
                None => debug!("no captioner configured, ignoring image"),
            }
        }

        self.recommend(signals).await
    }

    /// Recommend one poem for `signals`.
    pub async fn recommend(&self, signals: QuerySignals) -> Result<Recommendation, PipelineError> {
        let span = tracing::span!(Level::INFO, "recommend.recommend");
        let start = Instant::now();

        let result = self.run(&signals).instrument(span.clone()).await;
        let elapsed_micros = start.elapsed().as_micros() as u64;

        let _guard = span.enter();
        match &result {
            Ok(rec) => info!(
                well_formed = rec.well_formed,
                attempts = rec.attempts,
                candidates = rec.candidates.len(),
                elapsed_micros,
                "recommend_success"
            ),
            Err(err) => warn!(
                kind = %err.kind(),
                error = %err,
                elapsed_micros,
                "recommend_failure"
            ),
        }
        result
    }

    /// Delegates to the [`IngestionPipeline`], bounded by the embed and insert
    /// stage deadlines.
    pub async fn ingest(
        &self,
        title: &str,
        author: &str,
        excerpt: &str,
        source: &str,
    ) -> Result<PoemRecord, PipelineError> {
        Ok(self.ingestion.ingest(title, author, excerpt, source).await?)
    }

    pub async fn ingest_submission(
        &self,
        submission: PoemSubmission,
    ) -> Result<PoemRecord, PipelineError> {
        Ok(self.ingestion.ingest_submission(submission).await?)
    }

    /// Releases the index handle.
    pub async fn close(&self) -> Result<(), PipelineError> {
        Ok(self.index.close().await?)
    }

    async fn run(&self, signals: &QuerySignals) -> Result<Recommendation, PipelineError> {
        let query = fuse(signals)?;
        debug!(fields = signals.present_fields().count(), "signals fused");

        let vector = self.embed_query(query.as_str()).await?;

        let candidates = with_deadline(
            Stage::Search,
            self.cfg.timeouts.search,
            self.index.search(&vector, self.cfg.top_k),
        )
        .await?;
        debug!(hits = candidates.len(), "candidates retrieved");

        self.select_and_validate(signals, &candidates).await
    }

    /// Embeds with upstream retries, then once more if the vector was malformed.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let embedding = match self.embed_with_retry(text).await {
            Err(PipelineError::Embedding(SemanticError::Format(detail))) => {
                warn!(detail = %detail, "embedding malformed, re-embedding once");
                self.embed_with_retry(text).await?
            }
            other => other?,
        };
        Ok(embedding.into_vector())
    }

    async fn embed_with_retry(
        &self,
        text: &str,
    ) -> Result<semantic::SemanticEmbedding, PipelineError> {
        let deadline = self.cfg.timeouts.embed;
        execute_with_retry_async(
            &self.cfg.upstream_retry,
            PipelineError::is_retryable,
            |_| with_deadline(Stage::Embed, deadline, self.gateway.embed(text)),
        )
        .await
        .into_result()
    }

    async fn caption(&self, captioner: &dyn Captioner, url: &str) -> Result<String, PipelineError> {
        let deadline = self.cfg.timeouts.caption;
        execute_with_retry_async(
            &self.cfg.upstream_retry,
            PipelineError::is_retryable,
            |_| with_deadline(Stage::Caption, deadline, captioner.caption(url)),
        )
        .await
        .into_result()
    }

    async fn generate(
        &self,
        signals: &QuerySignals,
        candidates: &[ScoredPoem],
    ) -> Result<RawGenerationOutput, PipelineError> {
        let deadline = self.cfg.timeouts.generate;
        execute_with_retry_async(
            &self.cfg.upstream_retry,
            PipelineError::is_retryable,
            |_| with_deadline(Stage::Generate, deadline, self.selector.select(signals, candidates)),
        )
        .await
        .into_result()
    }

    /// Bounded contract retries with the same candidates, then degrade or withhold.
    async fn select_and_validate(
        &self,
        signals: &QuerySignals,
        candidates: &[ScoredPoem],
    ) -> Result<Recommendation, PipelineError> {
        let summaries: Vec<CandidateSummary> = candidates.iter().map(Into::into).collect();
        let max_attempts = self.cfg.max_contract_retries + 1;
        let mut attempts = 0;

        let (raw, violation) = loop {
            attempts += 1;
            let raw = self.generate(signals, candidates).await?;
            match self.validator.validate(raw.as_str()) {
                Ok(response) => {
                    return Ok(Recommendation {
                        well_formed: true,
                        response: Some(response),
                        raw_text: raw.into_string(),
                        violation: None,
                        attempts,
                        candidates: summaries,
                    })
                }
                Err(violation) if attempts < max_attempts => {
                    warn!(attempt = attempts, violation = %violation.kind(), "contract violation, regenerating");
                }
                Err(violation) => break (raw, violation),
            }
        };

        self.degrade(raw, violation, attempts, candidates, summaries)
    }

    /// Withholds text that leaks a personal attribute; otherwise returns it
    /// unparsed when degrading is enabled. Lines quoted from a candidate poem
    /// are not scanned.
    fn degrade(
        &self,
        raw: RawGenerationOutput,
        violation: ContractViolation,
        attempts: u32,
        candidates: &[ScoredPoem],
        summaries: Vec<CandidateSummary>,
    ) -> Result<Recommendation, PipelineError> {
        let kind = violation.kind();
        let written = unquoted_lines(raw.as_str(), candidates);
        if violation.is_identity_leak() || self.validator.scan_identity(&written).is_some() {
            warn!(violation = %kind, attempts, "response withheld");
            return Err(PipelineError::ResponseWithheld { violation: kind });
        }
        if !self.cfg.degrade_on_violation {
            return Err(PipelineError::Contract(violation));
        }

        warn!(violation = %kind, attempts, "returning degraded response");
        Ok(Recommendation {
            well_formed: false,
            response: None,
            raw_text: raw.into_string(),
            violation: Some(kind),
            attempts,
            candidates: summaries,
        })
    }
}

/// Lines of `raw` that are not copied from a candidate's title, author or excerpt.
fn unquoted_lines(raw: &str, candidates: &[ScoredPoem]) -> String {
    let quoted: HashSet<&str> = candidates
        .iter()
        .flat_map(|c| {
            let poem = &c.record;
            [poem.title.as_str(), poem.author.as_str()]
                .into_iter()
                .chain(poem.excerpt.lines())
        })
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    raw.lines()
        .map(str::trim)
        .filter(|line| !quoted.contains(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bounds `fut` by `deadline`; an elapsed deadline is a [`PipelineError::StageTimeout`].
async fn with_deadline<T, E, F>(stage: Stage, deadline: Duration, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, E>>,
    PipelineError: From<E>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(PipelineError::from),
        Err(_) => Err(PipelineError::StageTimeout {
            stage,
            after: deadline,
        }),
    }
}
