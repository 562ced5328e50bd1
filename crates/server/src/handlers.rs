use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub index_path: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// POST /upload - multipart PDF upload; rebuilds the index and schedules
/// pipeline re-initialization in the background.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::BadRequest(format!("malformed multipart body: {error}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("file field has no filename".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|error| ApiError::BadRequest(format!("failed to read upload: {error}")))?;

        let receipt = state.ingest_upload(&filename, bytes.to_vec()).await?;

        // Fire-and-forget: the response does not wait for re-initialization;
        // a query racing it will lazily load the freshly persisted index.
        let background = state.clone();
        tokio::spawn(async move {
            background.initialize_pipeline().await;
        });

        info!(filename = %receipt.filename, "upload processed, index replaced");

        return Ok(Json(UploadResponse {
            message: "File processed successfully and index created/updated.".to_string(),
            filename: receipt.filename,
            index_path: receipt.index_path,
        }));
    }

    Err(ApiError::BadRequest(
        "multipart field `file` is required".to_string(),
    ))
}

/// POST /query - answer a question about the ingested document.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let result = state.answer_question(&request.question).await?;
    Ok(Json(QueryResponse {
        answer: result.answer,
    }))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
