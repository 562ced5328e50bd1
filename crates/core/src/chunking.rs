use crate::error::IngestError;
use crate::models::{DocumentChunk, DocumentFingerprint};
use sha2::{Digest, Sha256};

pub const DEFAULT_CHUNK_MAX_CHARS: usize = 1_000;
pub const DEFAULT_CHUNK_OVERLAP_CHARS: usize = 150;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_CHUNK_MAX_CHARS,
            overlap_chars: DEFAULT_CHUNK_OVERLAP_CHARS,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.max_chars == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than max chunk size {}",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

/// A window into the chunked text, in char offsets of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub char_start: usize,
    pub char_end: usize,
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{a0}', " ")
}

/// Split `text` into ordered windows of at most `max_chars` chars where
/// consecutive windows share `overlap_chars` chars. Empty input yields an
/// empty vec. Dropping the leading overlap of every window after the first
/// and concatenating reconstructs the input exactly.
pub fn split_with_overlap(text: &str, config: ChunkingConfig) -> Result<Vec<ChunkSpan>, IngestError> {
    config.validate()?;

    let total = text.chars().count();
    if total == 0 {
        return Ok(Vec::new());
    }

    let stride = config.max_chars - config.overlap_chars;
    let mut spans = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + config.max_chars).min(total);
        spans.push(ChunkSpan {
            char_start: start,
            char_end: end,
        });
        if end == total {
            break;
        }
        start += stride;
    }

    Ok(spans)
}

fn slice_chars(text: &str, span: ChunkSpan) -> String {
    text.chars()
        .skip(span.char_start)
        .take(span.char_end - span.char_start)
        .collect()
}

/// Chunk one page of normalized text into [`DocumentChunk`]s, continuing the
/// document-wide `cursor` so chunk indices stay globally ordered.
pub fn build_chunks(
    document: &DocumentFingerprint,
    page: u32,
    page_text: &str,
    config: ChunkingConfig,
    cursor: u64,
) -> Result<(Vec<DocumentChunk>, u64), IngestError> {
    let spans = split_with_overlap(page_text, config)?;

    let mut chunks = Vec::with_capacity(spans.len());
    let mut next = cursor;

    for span in spans {
        let text = slice_chars(page_text, span);
        if text.trim().is_empty() {
            continue;
        }

        chunks.push(DocumentChunk {
            chunk_id: make_chunk_id(&document.document_id, page, next, &text),
            document_id: document.document_id.clone(),
            filename: document.filename.clone(),
            page,
            chunk_index: next,
            char_start: span.char_start,
            char_end: span.char_end,
            text,
        });

        next = next.saturating_add(1);
    }

    Ok((chunks, next))
}

fn make_chunk_id(document_id: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fingerprint() -> DocumentFingerprint {
        DocumentFingerprint {
            document_id: "doc-1".to_string(),
            filename: "report.pdf".to_string(),
            checksum: "checksum".to_string(),
            ingested_at: Utc::now(),
        }
    }

    fn reconstruct(text: &str, spans: &[ChunkSpan], overlap: usize) -> String {
        let mut joined = String::new();
        for (position, span) in spans.iter().enumerate() {
            let skip = if position == 0 { 0 } else { overlap };
            joined.extend(
                text.chars()
                    .skip(span.char_start + skip)
                    .take(span.char_end - span.char_start - skip),
            );
        }
        joined
    }

    #[test]
    fn whitespace_is_normalized() {
        let input = "A  \t  lot\nof   spacing";
        assert_eq!(normalize_whitespace(input), "A lot of spacing");
    }

    #[test]
    fn empty_input_yields_no_spans() {
        let spans = split_with_overlap("", ChunkingConfig::default()).unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn overlap_join_reconstructs_input() {
        let config = ChunkingConfig {
            max_chars: 40,
            overlap_chars: 7,
        };
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);

        let spans = split_with_overlap(&text, config).unwrap();
        assert!(spans.len() > 1);
        assert_eq!(reconstruct(&text, &spans, config.overlap_chars), text);
    }

    #[test]
    fn no_span_exceeds_max_chars() {
        let config = ChunkingConfig {
            max_chars: 25,
            overlap_chars: 5,
        };
        let text = "x".repeat(1_003);

        let spans = split_with_overlap(&text, config).unwrap();
        for span in &spans {
            assert!(span.char_end - span.char_start <= config.max_chars);
        }
    }

    #[test]
    fn consecutive_spans_share_the_overlap() {
        let config = ChunkingConfig {
            max_chars: 30,
            overlap_chars: 10,
        };
        let text = "abcdefghij".repeat(12);

        let spans = split_with_overlap(&text, config).unwrap();
        for pair in spans.windows(2) {
            assert_eq!(pair[0].char_end - pair[1].char_start, config.overlap_chars);
        }
    }

    #[test]
    fn overlap_must_stay_below_max_size() {
        let config = ChunkingConfig {
            max_chars: 100,
            overlap_chars: 100,
        };
        assert!(matches!(
            split_with_overlap("some text", config),
            Err(IngestError::InvalidChunkConfig(_))
        ));
    }

    #[test]
    fn chunk_ids_depend_on_position_and_text() {
        let config = ChunkingConfig {
            max_chars: 20,
            overlap_chars: 4,
        };
        let document = fingerprint();
        let (chunks, cursor) =
            build_chunks(&document, 1, &"word ".repeat(30), config, 0).unwrap();

        assert!(!chunks.is_empty());
        assert_eq!(cursor, chunks.len() as u64);
        let mut ids: Vec<_> = chunks.iter().map(|chunk| &chunk.chunk_id).collect();
        ids.dedup();
        assert_eq!(ids.len(), chunks.len());
        assert_eq!(chunks[0].filename, "report.pdf");
    }

    #[test]
    fn multibyte_text_is_sliced_on_char_boundaries() {
        let config = ChunkingConfig {
            max_chars: 8,
            overlap_chars: 2,
        };
        let text = "héllø wörld ünïcode tèxt";
        let spans = split_with_overlap(text, config).unwrap();
        assert_eq!(reconstruct(text, &spans, config.overlap_chars), text);
    }
}
