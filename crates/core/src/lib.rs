pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod pipeline;

pub use chunking::{
    build_chunks, normalize_whitespace, split_with_overlap, ChunkSpan, ChunkingConfig,
    DEFAULT_CHUNK_MAX_CHARS, DEFAULT_CHUNK_OVERLAP_CHARS,
};
pub use embeddings::{Embedder, HashedNgramEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{IndexError, IngestError, PipelineError};
pub use extractor::{LopdfExtractor, PageText, PdfExtractor};
pub use index::{ChunkIndex, IndexEntry, LoadOutcome, INDEX_FILE_NAME};
pub use ingest::{digest_file, fingerprint_document, ingest_document};
pub use llm::{ChatModel, GroqChatModel, DEFAULT_CHAT_ENDPOINT, DEFAULT_CHAT_MODEL};
pub use models::{DocumentChunk, DocumentFingerprint, QaAnswer, ScoredChunk};
pub use pipeline::{build_user_prompt, QaPipeline, TOP_K};
