use crate::chunking::{build_chunks, normalize_whitespace, ChunkingConfig};
use crate::error::IngestError;
use crate::extractor::PdfExtractor;
use crate::models::{DocumentChunk, DocumentFingerprint};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn fingerprint_document(path: &Path) -> Result<DocumentFingerprint, IngestError> {
    let checksum = digest_file(path)?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    Ok(DocumentFingerprint {
        document_id: Uuid::new_v4().to_string(),
        filename: filename.to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}

/// Extract and chunk a single document. Zero resulting chunks is a
/// distinguishable processing failure, never a silent empty success.
pub fn ingest_document<X: PdfExtractor + ?Sized>(
    path: &Path,
    extractor: &X,
    config: ChunkingConfig,
) -> Result<(DocumentFingerprint, Vec<DocumentChunk>), IngestError> {
    config.validate()?;

    let fingerprint = fingerprint_document(path)?;
    let pages = extractor.extract_pages(path)?;

    let mut chunks = Vec::new();
    let mut cursor = 0u64;

    for page in pages {
        let normalized = normalize_whitespace(&page.text);
        let (page_chunks, next_cursor) =
            build_chunks(&fingerprint, page.number, &normalized, config, cursor)?;
        cursor = next_cursor;
        chunks.extend(page_chunks);
    }

    if chunks.is_empty() {
        return Err(IngestError::EmptyDocument(format!(
            "no extractable text in {}",
            path.display()
        )));
    }

    debug!(
        filename = %fingerprint.filename,
        chunk_count = chunks.len(),
        "chunked document"
    );

    Ok((fingerprint, chunks))
}
