use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("insert error: {0}")]
    Insert(String),
    #[error("upsert error: {0}")]
    Upsert(String),
    #[error("search error: {0}")]
    Search(String),
    #[error("scroll error: {0}")]
    Scroll(String),
    #[error("persist error: {0}")]
    Persist(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored chunk: text, its embedding, and metadata, keyed by chunk ID.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait VectorStore: Send + Sync {
    /// IDs of every stored record, without loading content.
    fn ids(&self) -> BoxFuture<'_, Result<HashSet<String>, VectorStoreError>>;

    /// Map of record ID to the string value of metadata `field`, for records that have it.
    fn scroll_field(
        &self,
        field: &str,
    ) -> BoxFuture<'_, Result<HashMap<String, String>, VectorStoreError>>;

    /// Insert records under their IDs. Fails if any ID is already stored.
    fn insert(&self, records: Vec<VectorRecord>) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// Insert records, replacing any stored record with the same ID.
    fn upsert(&self, records: Vec<VectorRecord>) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// Top `limit` records by cosine similarity to `vector`, best first.
    fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ScoredRecord>, VectorStoreError>>;

    fn count(&self) -> BoxFuture<'_, Result<usize, VectorStoreError>>;

    /// Flush pending writes to durable storage.
    fn persist(&self) -> BoxFuture<'_, Result<(), VectorStoreError>>;
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Cosine similarity of a stored embedding to the query.
///
/// Sizes differ when the store was built with another embedding model; that
/// is an error rather than a score over the shared prefix.
pub(crate) fn score(id: &str, query: &[f32], stored: &[f32]) -> Result<f32, VectorStoreError> {
    if query.len() != stored.len() {
        return Err(VectorStoreError::Search(format!(
            "{id}: stored embedding has {} dimensions but the query has {}, \
             rebuild the store with --reset",
            stored.len(),
            query.len()
        )));
    }
    Ok(cosine_similarity(query, stored))
}

/// Sort best-first (ties broken by ID for stable output) and keep `limit`.
pub(crate) fn rank(mut scored: Vec<ScoredRecord>, limit: usize) -> Vec<ScoredRecord> {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(limit);
    scored
}
