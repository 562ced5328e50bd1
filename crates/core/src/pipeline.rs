use crate::embeddings::{Embedder, HashedNgramEmbedder};
use crate::error::PipelineError;
use crate::index::ChunkIndex;
use crate::llm::ChatModel;
use crate::models::{QaAnswer, ScoredChunk};
use std::sync::Arc;
use tracing::debug;

/// Number of chunks retrieved as grounding context per question.
pub const TOP_K: usize = 3;

const SYSTEM_PROMPT: &str = "You are an assistant that answers questions about an uploaded \
document. Answer using only the context provided below. If the context does not contain the \
answer, say that you don't know instead of making something up.";

pub fn build_user_prompt(question: &str, context: &[ScoredChunk]) -> String {
    let mut prompt = String::from("<context>\n");
    for hit in context {
        prompt.push_str(&format!("[page {}] {}\n", hit.chunk.page, hit.chunk.text));
    }
    prompt.push_str("</context>\n\nQuestion: ");
    prompt.push_str(question);
    prompt
}

/// Retrieval-augmented answering over one loaded [`ChunkIndex`]. Holds no
/// per-call state; each `answer` is independent.
pub struct QaPipeline {
    index: ChunkIndex,
    embedder: HashedNgramEmbedder,
    model: Arc<dyn ChatModel>,
}

impl QaPipeline {
    pub fn new(index: ChunkIndex, embedder: HashedNgramEmbedder, model: Arc<dyn ChatModel>) -> Self {
        Self {
            index,
            embedder,
            model,
        }
    }

    pub fn document_filename(&self) -> &str {
        &self.index.document.filename
    }

    pub async fn answer(&self, question: &str) -> Result<QaAnswer, PipelineError> {
        let query_vector = self.embedder.embed(question);
        let context = self.index.search(&query_vector, TOP_K)?;

        debug!(
            question_len = question.len(),
            retrieved = context.len(),
            "retrieved grounding context"
        );

        let user_prompt = build_user_prompt(question, &context);
        let answer = self.model.complete(SYSTEM_PROMPT, &user_prompt).await?;

        Ok(QaAnswer { answer, context })
    }
}
