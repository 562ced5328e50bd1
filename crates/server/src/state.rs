use crate::error::ApiError;
use pdf_qa_core::{
    ChatModel, ChunkIndex, ChunkingConfig, HashedNgramEmbedder, LoadOutcome, PdfExtractor,
    PipelineError, QaAnswer, QaPipeline,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

/// Returned only when the model produced no answer text, never when it
/// errored.
const FALLBACK_ANSWER: &str = "Sorry, I couldn't find an answer to that question.";

#[derive(Debug, Clone, serde::Serialize)]
pub struct UploadReceipt {
    pub filename: String,
    pub index_path: String,
}

/// Process-wide service state, owned explicitly and injected into handlers.
///
/// The answer pipeline lives in a readiness slot: `None` until an index has
/// been loaded or built, replaced wholesale after each ingestion. Uploads are
/// serialized through `ingest_lock` since there is exactly one index per
/// deployment, and `init_lock` keeps lazy initializers from racing the
/// background rebuild.
pub struct AppState {
    index_dir: PathBuf,
    chunking: ChunkingConfig,
    embedder: HashedNgramEmbedder,
    extractor: Arc<dyn PdfExtractor>,
    model: Option<Arc<dyn ChatModel>>,
    pipeline: RwLock<Option<Arc<QaPipeline>>>,
    ingest_lock: Mutex<()>,
    init_lock: Mutex<()>,
}

impl AppState {
    pub fn new(
        index_dir: PathBuf,
        extractor: Arc<dyn PdfExtractor>,
        model: Option<Arc<dyn ChatModel>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            index_dir,
            chunking: ChunkingConfig::default(),
            embedder: HashedNgramEmbedder::default(),
            extractor,
            model,
            pipeline: RwLock::new(None),
            ingest_lock: Mutex::new(()),
            init_lock: Mutex::new(()),
        })
    }

    pub async fn is_ready(&self) -> bool {
        self.pipeline.read().await.is_some()
    }

    /// Best-effort (re)initialization from the persisted index. Used at
    /// startup and as the background task after each upload; failures are
    /// logged and leave the previous pipeline in place.
    pub async fn initialize_pipeline(&self) {
        match self.load_pipeline().await {
            Ok(pipeline) => {
                let filename = pipeline.document_filename().to_string();
                *self.pipeline.write().await = Some(pipeline);
                info!(document = %filename, "answer pipeline initialized");
            }
            Err(ApiError::Unavailable(message)) => {
                warn!(%message, "answer pipeline not initialized");
            }
            Err(other) => {
                error!(error = ?other, "failed to initialize answer pipeline");
            }
        }
    }

    /// Lazy readiness: return the live pipeline, or try once to build it from
    /// the persisted index before reporting unavailability.
    async fn ensure_pipeline(&self) -> Result<Arc<QaPipeline>, ApiError> {
        if let Some(pipeline) = self.pipeline.read().await.as_ref() {
            return Ok(pipeline.clone());
        }

        let _init = self.init_lock.lock().await;
        if let Some(pipeline) = self.pipeline.read().await.as_ref() {
            return Ok(pipeline.clone());
        }

        let pipeline = self.load_pipeline().await?;
        *self.pipeline.write().await = Some(pipeline.clone());
        Ok(pipeline)
    }

    async fn load_pipeline(&self) -> Result<Arc<QaPipeline>, ApiError> {
        let model = self.model.clone().ok_or_else(|| {
            ApiError::Unavailable("chat model not configured; set GROQ_API_KEY".to_string())
        })?;

        match ChunkIndex::load(&self.index_dir)? {
            LoadOutcome::Loaded(index) => {
                Ok(Arc::new(QaPipeline::new(index, self.embedder, model)))
            }
            LoadOutcome::Absent => Err(ApiError::Unavailable(
                "no document has been ingested yet; upload a PDF first".to_string(),
            )),
        }
    }

    /// Ingest one uploaded file: validate, persist to a request-scoped temp
    /// directory, extract + chunk + embed off the async runtime, then
    /// atomically replace the persisted index.
    pub async fn ingest_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, ApiError> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ApiError::BadRequest("upload has no usable filename".to_string()))?
            .to_string();

        if !name.to_lowercase().ends_with(".pdf") {
            return Err(ApiError::BadRequest(format!(
                "invalid file type: {name}; only PDFs are accepted"
            )));
        }

        let _ingest = self.ingest_lock.lock().await;

        // Scoped temp dir: removed on every exit path once `staging` drops.
        let staging = tempfile::tempdir()
            .map_err(|error| ApiError::Internal(format!("failed to stage upload: {error}")))?;
        let staged_path = staging.path().join(&name);
        tokio::fs::write(&staged_path, &bytes)
            .await
            .map_err(|error| ApiError::Internal(format!("failed to save upload: {error}")))?;

        info!(filename = %name, bytes = bytes.len(), "staged upload for processing");

        let extractor = self.extractor.clone();
        let chunking = self.chunking;
        let embedder = self.embedder;
        let index_dir = self.index_dir.clone();

        let index_path = tokio::task::spawn_blocking(move || {
            let (fingerprint, chunks) =
                pdf_qa_core::ingest_document(&staged_path, extractor.as_ref(), chunking)?;
            let index = ChunkIndex::build(fingerprint, chunks, &embedder)?;
            index.save(&index_dir).map_err(ApiError::from)
        })
        .await
        .map_err(|error| ApiError::Internal(format!("ingestion task failed: {error}")))??;

        Ok(UploadReceipt {
            filename: name,
            index_path: index_path.display().to_string(),
        })
    }

    /// Answer one question against the current index, lazily initializing the
    /// pipeline if a persisted index exists but no pipeline is live yet.
    pub async fn answer_question(&self, question: &str) -> Result<QaAnswer, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::BadRequest("question must not be empty".to_string()));
        }

        let pipeline = self.ensure_pipeline().await?;

        match pipeline.answer(question).await {
            Ok(answer) => Ok(answer),
            Err(PipelineError::EmptyCompletion) => Ok(QaAnswer {
                answer: FALLBACK_ANSWER.to_string(),
                context: Vec::new(),
            }),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pdf_qa_core::{IngestError, PageText, INDEX_FILE_NAME};
    use std::path::Path;
    use tempfile::TempDir;

    struct FakeExtractor {
        pages: Vec<PageText>,
    }

    impl PdfExtractor for FakeExtractor {
        fn extract_pages(&self, _path: &Path) -> Result<Vec<PageText>, IngestError> {
            Ok(self.pages.clone())
        }
    }

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(&self, _system: &str, user: &str) -> Result<String, PipelineError> {
            Ok(format!("answered from: {}", user.len()))
        }
    }

    struct EmptyModel;

    #[async_trait]
    impl ChatModel for EmptyModel {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, PipelineError> {
            Err(PipelineError::EmptyCompletion)
        }
    }

    fn report_pages() -> Vec<PageText> {
        vec![PageText {
            number: 1,
            text: "The total revenue for the fiscal year was ten million dollars. ".repeat(10),
        }]
    }

    fn state_with(
        dir: &TempDir,
        pages: Vec<PageText>,
        model: Option<Arc<dyn ChatModel>>,
    ) -> Arc<AppState> {
        AppState::new(
            dir.path().join("index"),
            Arc::new(FakeExtractor { pages }),
            model,
        )
    }

    #[tokio::test]
    async fn wrong_extension_is_rejected_without_touching_the_index() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, report_pages(), Some(Arc::new(EchoModel)));

        let result = state.ingest_upload("notes.txt", b"hello".to_vec()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert!(!dir.path().join("index").join(INDEX_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn empty_question_is_rejected_before_touching_the_pipeline() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, report_pages(), Some(Arc::new(EchoModel)));

        state
            .ingest_upload("report.pdf", b"%PDF-1.4 fake".to_vec())
            .await
            .unwrap();

        let result = state.answer_question("   ").await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        // Validation runs before the lazy pipeline load.
        assert!(!state.is_ready().await);
    }

    #[tokio::test]
    async fn query_before_any_ingest_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, report_pages(), Some(Arc::new(EchoModel)));

        let result = state.answer_question("what is the revenue?").await;
        assert!(matches!(result, Err(ApiError::Unavailable(_))));
    }

    #[tokio::test]
    async fn ingest_then_query_produces_a_generation_attempt() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, report_pages(), Some(Arc::new(EchoModel)));

        let receipt = state
            .ingest_upload("report.pdf", b"%PDF-1.4 fake".to_vec())
            .await
            .unwrap();
        assert_eq!(receipt.filename, "report.pdf");
        assert!(dir.path().join("index").join(INDEX_FILE_NAME).exists());

        state.initialize_pipeline().await;
        assert!(state.is_ready().await);

        let answer = state.answer_question("what is the revenue?").await.unwrap();
        assert!(answer.answer.starts_with("answered from:"));
        assert!(!answer.context.is_empty());
    }

    #[tokio::test]
    async fn query_lazily_initializes_from_the_persisted_index() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, report_pages(), Some(Arc::new(EchoModel)));

        state
            .ingest_upload("report.pdf", b"%PDF-1.4 fake".to_vec())
            .await
            .unwrap();

        // No explicit initialize: the query path must recover readiness.
        assert!(!state.is_ready().await);
        let answer = state.answer_question("what is the revenue?").await.unwrap();
        assert!(answer.answer.starts_with("answered from:"));
        assert!(state.is_ready().await);
    }

    #[tokio::test]
    async fn empty_document_is_a_processing_error() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, Vec::new(), Some(Arc::new(EchoModel)));

        let result = state
            .ingest_upload("blank.pdf", b"%PDF-1.4 fake".to_vec())
            .await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
        assert!(!dir.path().join("index").join(INDEX_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn corrupt_index_is_distinguishable_from_absent() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, report_pages(), Some(Arc::new(EchoModel)));

        let index_dir = dir.path().join("index");
        std::fs::create_dir_all(&index_dir).unwrap();
        std::fs::write(index_dir.join(INDEX_FILE_NAME), b"{ not json").unwrap();

        let result = state.answer_question("anything").await;
        assert!(matches!(result, Err(ApiError::IndexCorrupt(_))));
    }

    #[tokio::test]
    async fn reingesting_the_same_document_retrieves_equivalent_context() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, report_pages(), Some(Arc::new(EchoModel)));

        state
            .ingest_upload("report.pdf", b"%PDF-1.4 fake".to_vec())
            .await
            .unwrap();
        state.initialize_pipeline().await;
        let first = state.answer_question("what is the revenue?").await.unwrap();

        state
            .ingest_upload("report.pdf", b"%PDF-1.4 fake".to_vec())
            .await
            .unwrap();
        state.initialize_pipeline().await;
        let second = state.answer_question("what is the revenue?").await.unwrap();

        let texts = |answer: &QaAnswer| {
            answer
                .context
                .iter()
                .map(|hit| hit.chunk.text.clone())
                .collect::<Vec<_>>()
        };
        assert!(!first.context.is_empty());
        assert_eq!(texts(&first), texts(&second));
    }

    #[tokio::test]
    async fn missing_model_reports_unavailable_not_a_crash() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, report_pages(), None);

        state
            .ingest_upload("report.pdf", b"%PDF-1.4 fake".to_vec())
            .await
            .unwrap();

        let result = state.answer_question("what is the revenue?").await;
        assert!(matches!(result, Err(ApiError::Unavailable(_))));
    }

    #[tokio::test]
    async fn empty_completion_falls_back_to_the_fixed_answer_text() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, report_pages(), Some(Arc::new(EmptyModel)));

        state
            .ingest_upload("report.pdf", b"%PDF-1.4 fake".to_vec())
            .await
            .unwrap();

        let answer = state.answer_question("what is the revenue?").await.unwrap();
        assert_eq!(answer.answer, FALLBACK_ANSWER);
    }
}
