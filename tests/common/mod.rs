#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use photopoem::{
    Captioner, ChatMessage, EmbeddingGateway, GenerationError, InMemoryIndex, IndexError,
    NewPoem, PhotopoemConfig, PoemRecord, PoemWriter, Recommender, RetryConfig,
    SemanticEmbedding, SemanticError, SimilarityResult, StubEmbedder, VectorIndex,
};

pub const DIM: usize = 64;

pub const WELL_FORMED: &str = "서시\n윤동주\n죽는 날까지 하늘을 우러러\n한 점 부끄럼이 없기를\n\n잎새에 이는 바람에도\n나는 괴로워했다\n\n\n오늘 밤하늘을 올려다본 너에게 딱 어울리는 시야. 출처: 윤동주, 『하늘과 바람과 별과 시』(1948).";

pub const NO_SEPARATOR: &str = "서시\n윤동주\n죽는 날까지 하늘을 우러러\n오늘 밤하늘과 어울리는 시야.";

pub const LEAKY: &str = "서시\n윤동주\n죽는 날까지 하늘을 우러러\n\n\n사진 속 얼굴이 환해서 골랐어.";

/// One scripted writer reply.
#[derive(Clone)]
pub enum Reply {
    Text(&'static str),
    Fail { retryable: bool },
    Hang,
}

/// Writer that plays back replies in order, then keeps repeating the last one.
pub struct ScriptedWriter {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    calls: AtomicUsize,
}

impl ScriptedWriter {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(text: &'static str) -> Arc<Self> {
        Self::new([Reply::Text(text)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let mut queue = self.replies.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(next) = queue.pop_front() {
            *last = Some(next);
        }
        last.clone().expect("scripted writer needs at least one reply")
    }
}

#[async_trait]
impl PoemWriter for ScriptedWriter {
    async fn write(&self, _messages: &[ChatMessage]) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_reply() {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::Fail { retryable } => Err(GenerationError::Upstream {
                message: "HTTP 503 from writer".into(),
                retryable,
            }),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// Captioner that returns a fixed caption and records the URLs it was given.
pub struct FixedCaptioner {
    caption: &'static str,
    seen: Mutex<Vec<String>>,
}

impl FixedCaptioner {
    pub fn new(caption: &'static str) -> Arc<Self> {
        Arc::new(Self {
            caption,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Captioner for FixedCaptioner {
    async fn caption(&self, image_url: &str) -> Result<String, GenerationError> {
        self.seen.lock().unwrap().push(image_url.to_string());
        Ok(self.caption.to_string())
    }
}

/// Embedding gateway that plays back failures before delegating to the stub.
pub struct FlakyEmbedder {
    inner: StubEmbedder,
    failures: Mutex<VecDeque<SemanticError>>,
    calls: AtomicUsize,
}

impl FlakyEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: StubEmbedder::new(DIM),
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Queue failures for the next calls.
    pub fn fail_next(&self, failures: impl IntoIterator<Item = SemanticError>) {
        self.failures.lock().unwrap().extend(failures);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingGateway for FlakyEmbedder {
    async fn embed(&self, text: &str) -> Result<SemanticEmbedding, SemanticError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.failures.lock().unwrap().pop_front();
        match failure {
            Some(err) => Err(err),
            None => Ok(self.inner.embed_sync(text)),
        }
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "flaky-stub"
    }
}

/// Index whose inserts and searches never complete.
pub struct StalledIndex;

#[async_trait]
impl VectorIndex for StalledIndex {
    fn dimension(&self) -> usize {
        DIM
    }

    async fn insert(&self, _poem: NewPoem) -> Result<PoemRecord, IndexError> {
        std::future::pending().await
    }

    async fn search(&self, _query: &[f32], _k: usize) -> Result<SimilarityResult, IndexError> {
        std::future::pending().await
    }

    async fn len(&self) -> Result<usize, IndexError> {
        Ok(0)
    }
}

/// Offline configuration with near-instant retries.
pub fn test_config() -> PhotopoemConfig {
    let mut cfg = PhotopoemConfig::offline(DIM);
    cfg.pipeline.upstream_retry = RetryConfig::default()
        .with_base_delay(Duration::from_millis(1))
        .with_jitter(false);
    cfg
}

pub const POEMS: [(&str, &str, &str, &str); 3] = [
    (
        "진달래꽃",
        "김소월",
        "나 보기가 역겨워 가실 때에는 말없이 고이 보내 드리우리다",
        "『진달래꽃』(1925)",
    ),
    (
        "서시",
        "윤동주",
        "죽는 날까지 하늘을 우러러 한 점 부끄럼이 없기를",
        "『하늘과 바람과 별과 시』(1948)",
    ),
    (
        "향수",
        "정지용",
        "넓은 벌 동쪽 끝으로 옛이야기 지줄대는 실개천이 회돌아 나가고",
        "『정지용 시집』(1935)",
    ),
];

pub fn build(
    gateway: Arc<dyn EmbeddingGateway>,
    writer: Arc<dyn PoemWriter>,
    cfg: &PhotopoemConfig,
) -> Recommender {
    let index = Arc::new(InMemoryIndex::new(DIM));
    Recommender::new(gateway, index, writer, cfg).expect("valid test pipeline")
}

/// Stub embedder, in-memory index, the three seed poems.
pub async fn seeded(writer: Arc<dyn PoemWriter>, cfg: &PhotopoemConfig) -> Recommender {
    let rec = build(Arc::new(StubEmbedder::new(DIM)), writer, cfg);
    seed(&rec).await;
    rec
}

pub async fn seed(rec: &Recommender) {
    for (title, author, excerpt, source) in POEMS {
        rec.ingest(title, author, excerpt, source)
            .await
            .expect("seed ingest");
    }
}
