use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdf_qa_core::{IndexError, IngestError, PipelineError};
use serde::Serialize;

/// Service-boundary error type. Every failure is converted into a
/// user-visible JSON body here; nothing is silently absorbed.
#[derive(Debug)]
pub enum ApiError {
    /// 400 - bad input (wrong file type, malformed request)
    BadRequest(String),

    /// 503 - pipeline not initialized; caller should ingest first
    Unavailable(String),

    /// 503 - a persisted index exists but cannot be read
    IndexCorrupt(String),

    /// 500 - processing or generation failure
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            ApiError::Unavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
            }
            ApiError::IndexCorrupt(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, "index_corrupt", message)
            }
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        match error {
            IngestError::MissingFileName(message) => ApiError::BadRequest(message),
            other => ApiError::Internal(format!("failed to process document: {other}")),
        }
    }
}

impl From<IndexError> for ApiError {
    fn from(error: IndexError) -> Self {
        match error {
            IndexError::Corrupt { .. } => ApiError::IndexCorrupt(error.to_string()),
            other => ApiError::Internal(format!("index failure: {other}")),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        ApiError::Internal(format!("failed to generate answer: {error}"))
    }
}
