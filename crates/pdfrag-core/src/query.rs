//! Retrieval-augmented answering over the vector store.

use std::sync::Arc;

use pdfrag_llm::{EmbedFn, LlmError, LlmProvider, Message};
use pdfrag_memory::{VectorStore, VectorStoreError};

/// Separator placed between retrieved chunks in the prompt context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("failed to embed question: {0}")]
    Embed(#[source] LlmError),
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] VectorStoreError),
    #[error("answer generation failed: {0}")]
    Generation(#[source] LlmError),
}

#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub text: String,
    /// IDs of the chunks the answer was grounded on, best match first.
    pub sources: Vec<String>,
}

#[must_use]
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based only on the following context:\n\n{context}\n\n---\n\n\
         Answer the question based on the above context: {question}"
    )
}

pub struct RagPipeline<P> {
    store: Arc<dyn VectorStore>,
    embed_fn: EmbedFn,
    provider: P,
    top_k: usize,
}

impl<P: LlmProvider> RagPipeline<P> {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, embed_fn: EmbedFn, provider: P, top_k: usize) -> Self {
        Self {
            store,
            embed_fn,
            provider,
            top_k,
        }
    }

    /// Answer `question` from the `top_k` most similar stored chunks.
    ///
    /// An empty store still produces an answer, generated from empty context.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding, retrieval, or generation fails.
    pub async fn query(&self, question: &str) -> Result<QueryResponse, QueryError> {
        let embedding = (self.embed_fn)(question).await.map_err(QueryError::Embed)?;
        let hits = self.store.search(embedding, self.top_k).await?;
        tracing::debug!(hits = hits.len(), top_k = self.top_k, "retrieved context");

        let context = hits
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        let prompt = build_prompt(&context, question);

        let text = self
            .provider
            .chat(&[Message::user(prompt)])
            .await
            .map_err(QueryError::Generation)?;

        Ok(QueryResponse {
            text,
            sources: hits.into_iter().map(|h| h.id).collect(),
        })
    }
}
