use crate::embeddings::Embedder;
use crate::error::IndexError;
use crate::models::{DocumentChunk, DocumentFingerprint, ScoredChunk};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const INDEX_FILE_NAME: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// The persisted similarity index: every chunk of the active document paired
/// with its embedding. One index exists per deployment; `save` replaces the
/// previous one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkIndex {
    pub dimensions: usize,
    pub document: DocumentFingerprint,
    pub entries: Vec<IndexEntry>,
}

/// Outcome of trying to read a persisted index. Absent is a normal state on
/// first boot; a present-but-unreadable file is reported as
/// [`IndexError::Corrupt`], never as absent.
#[derive(Debug)]
pub enum LoadOutcome {
    Absent,
    Loaded(ChunkIndex),
}

impl ChunkIndex {
    pub fn build<E: Embedder>(
        document: DocumentFingerprint,
        chunks: Vec<DocumentChunk>,
        embedder: &E,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyChunks);
        }

        let entries = chunks
            .into_iter()
            .map(|chunk| {
                let embedding = embedder.embed(&chunk.text);
                IndexEntry { chunk, embedding }
            })
            .collect::<Vec<_>>();

        debug!(entries = entries.len(), "embedded chunks into index");

        Ok(Self {
            dimensions: embedder.dimensions(),
            document,
            entries,
        })
    }

    /// Persist to `dir/index.json`. The index is written to a sibling temp
    /// file and renamed into place, so a reader never observes a
    /// partially written index.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, IndexError> {
        fs::create_dir_all(dir)?;

        let target = dir.join(INDEX_FILE_NAME);
        let staging = dir.join(format!("{INDEX_FILE_NAME}.tmp"));

        let payload = serde_json::to_vec(self)?;
        fs::write(&staging, payload)?;
        fs::rename(&staging, &target)?;

        info!(
            path = %target.display(),
            entries = self.entries.len(),
            document = %self.document.filename,
            "persisted chunk index"
        );
        Ok(target)
    }

    pub fn load(dir: &Path) -> Result<LoadOutcome, IndexError> {
        let target = dir.join(INDEX_FILE_NAME);
        if !target.exists() {
            return Ok(LoadOutcome::Absent);
        }

        let payload = fs::read(&target)?;
        let index: ChunkIndex =
            serde_json::from_slice(&payload).map_err(|error| IndexError::Corrupt {
                path: target.clone(),
                details: error.to_string(),
            })?;

        if index.entries.is_empty() {
            return Err(IndexError::Corrupt {
                path: target,
                details: "index file contains no entries".to_string(),
            });
        }

        Ok(LoadOutcome::Loaded(index))
    }

    /// Nearest-neighbor lookup: up to `k` chunks ordered by decreasing cosine
    /// similarity, ties broken by chunk index so results are deterministic.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if query_vector.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: query_vector.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, query_vector),
            })
            .collect();

        scored.sort_by(|left, right| {
            right
                .score
                .total_cmp(&left.score)
                .then(left.chunk.chunk_index.cmp(&right.chunk.chunk_index))
        });
        scored.truncate(k);

        Ok(scored)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
