use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("document produced no chunks: {0}")]
    EmptyDocument(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot build an index from zero chunks")]
    EmptyChunks,

    #[error("persisted index at {path} is corrupt: {details}")]
    Corrupt { path: PathBuf, details: String },

    #[error("query vector has {got} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] IndexError),

    #[error("chat model error after {attempts} attempt(s): {details}")]
    Generation { attempts: u32, details: String },

    #[error("chat model returned no answer text")]
    EmptyCompletion,
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
