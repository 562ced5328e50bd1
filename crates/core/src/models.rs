use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of one ingested document. Exactly one document is live per
/// deployment; a new upload fully replaces the previous fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub filename: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

/// A bounded span of extracted page text, the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub filename: String,
    pub page: u32,
    pub chunk_index: u64,
    pub char_start: usize,
    pub char_end: usize,
    pub text: String,
}

/// One retrieval hit, ordered by decreasing cosine similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Result of one answer-pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaAnswer {
    pub answer: String,
    pub context: Vec<ScoredChunk>,
}
