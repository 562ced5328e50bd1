use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Ingestion can embed a whole document, so it gets a long deadline.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);
const QUERY_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("the document is still processing or was not uploaded yet: {0}")]
    NotReady(String),

    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
pub struct UploadReceipt {
    pub filename: String,
    #[allow(dead_code)]
    pub index_path: String,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    error: Option<String>,
    message: Option<String>,
}

pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::builder().build()?,
        })
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadReceipt, ClientError> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.pdf")
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        debug!(filename = %filename, bytes = bytes.len(), "uploading document");

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error(response).await)
        }
    }

    pub async fn query(&self, question: &str) -> Result<String, ClientError> {
        debug!(question_chars = question.len(), "sending query");
        let response = self
            .http
            .post(format!("{}/query", self.base_url))
            .json(&serde_json::json!({ "question": question }))
            .timeout(QUERY_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: QueryBody = response.json().await?;
            // Missing answer field is the only case that gets fallback text.
            Ok(body
                .answer
                .unwrap_or_else(|| "Sorry, I couldn't find an answer.".to_string()))
        } else if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            Err(ClientError::NotReady(error_message(response).await))
        } else {
            Err(api_error(response).await)
        }
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let raw = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&raw)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or(raw)
}

async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let message = error_message(response).await;
    warn!(status, %message, "server rejected the request");
    ClientError::Api { status, message }
}
