//! Incremental indexing: embed and store only chunks the store has not seen.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pdfrag_llm::EmbedFn;

use crate::document::Chunk;
use crate::vector_store::{VectorRecord, VectorStore, VectorStoreError};

#[derive(Debug, Clone, Default)]
pub struct IndexerConfig {
    /// Re-embed and replace records whose ID exists but whose content hash changed.
    pub refresh_changed: bool,
}

/// Summary of an indexing run.
#[derive(Debug, Default)]
pub struct IndexReport {
    /// Records in the store before this run.
    pub existing: usize,
    /// Chunks offered to the indexer.
    pub candidates: usize,
    pub added: usize,
    pub refreshed: usize,
    pub unchanged: usize,
    /// Per-chunk failures; the affected chunks were not written.
    pub errors: Vec<String>,
}

impl IndexReport {
    #[must_use]
    pub fn written(&self) -> usize {
        self.added + self.refreshed
    }
}

pub struct IncrementalIndexer {
    store: Arc<dyn VectorStore>,
    embed_fn: EmbedFn,
    config: IndexerConfig,
}

impl IncrementalIndexer {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, embed_fn: EmbedFn, config: IndexerConfig) -> Self {
        Self {
            store,
            embed_fn,
            config,
        }
    }

    /// Add every chunk whose ID is not yet stored, then persist the store.
    ///
    /// Embedding failures are recorded per chunk in [`IndexReport::errors`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read, written, or persisted.
    pub async fn index(&self, chunks: &[Chunk]) -> Result<IndexReport, VectorStoreError> {
        let existing = self.store.ids().await?;
        let mut report = IndexReport {
            existing: existing.len(),
            candidates: chunks.len(),
            ..IndexReport::default()
        };
        tracing::info!(existing = report.existing, "number of existing documents in store");

        let stored_hashes = if self.config.refresh_changed {
            self.store.scroll_field("content_hash").await?
        } else {
            HashMap::new()
        };

        let mut seen: HashSet<&str> = HashSet::with_capacity(chunks.len());
        let mut new_chunks = Vec::new();
        let mut changed_chunks = Vec::new();

        for chunk in chunks {
            let id = chunk.id.as_str();
            if !seen.insert(id) {
                tracing::warn!(id, "duplicate chunk id in one run, keeping the first");
                report.errors.push(format!("{id}: duplicate chunk id"));
                continue;
            }
            if !existing.contains(id) {
                new_chunks.push(chunk);
            } else if self.config.refresh_changed
                && stored_hashes
                    .get(id)
                    .is_some_and(|hash| *hash != chunk.content_hash)
            {
                changed_chunks.push(chunk);
            } else {
                report.unchanged += 1;
            }
        }

        if new_chunks.is_empty() && changed_chunks.is_empty() {
            tracing::info!("no new documents to add");
            return Ok(report);
        }

        if !new_chunks.is_empty() {
            tracing::info!(count = new_chunks.len(), "adding new documents");
            let records = self.embed_all(&new_chunks, &mut report.errors).await;
            report.added = records.len();
            if !records.is_empty() {
                self.store.insert(records).await?;
            }
        }

        if !changed_chunks.is_empty() {
            tracing::info!(count = changed_chunks.len(), "refreshing changed documents");
            let records = self.embed_all(&changed_chunks, &mut report.errors).await;
            report.refreshed = records.len();
            if !records.is_empty() {
                self.store.upsert(records).await?;
            }
        }

        if report.written() > 0 {
            self.store.persist().await?;
        }

        Ok(report)
    }

    async fn embed_all(&self, chunks: &[&Chunk], errors: &mut Vec<String>) -> Vec<VectorRecord> {
        let mut records = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match (self.embed_fn)(&chunk.content).await {
                Ok(embedding) => records.push(chunk_to_record(chunk, embedding)),
                Err(e) => {
                    tracing::warn!(id = %chunk.id, "embedding failed: {e}");
                    errors.push(format!("{}: {e}", chunk.id));
                }
            }
        }
        records
    }
}

fn chunk_to_record(chunk: &Chunk, embedding: Vec<f32>) -> VectorRecord {
    let mut metadata = HashMap::from([
        ("chunk_index".to_owned(), serde_json::json!(chunk.chunk_index)),
        ("content_hash".to_owned(), serde_json::json!(chunk.content_hash)),
        (
            "content_type".to_owned(),
            serde_json::json!(chunk.metadata.content_type),
        ),
    ]);
    if let Some(source) = &chunk.metadata.source {
        metadata.insert("source".to_owned(), serde_json::json!(source));
    }
    if let Some(page) = chunk.metadata.page {
        metadata.insert("page".to_owned(), serde_json::json!(page));
    }

    VectorRecord {
        id: chunk.id.to_string(),
        embedding,
        text: chunk.content.clone(),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use pdfrag_llm::{EmbedFuture, LlmError};

    use super::*;
    use crate::document::{DocumentMetadata, PageChunks, identify_pages};
    use crate::in_memory_store::InMemoryVectorStore;

    fn embed_len() -> EmbedFn {
        Box::new(|text: &str| -> EmbedFuture {
            #[allow(clippy::cast_precision_loss)]
            let len = text.len() as f32;
            Box::pin(async move { Ok(vec![len, 1.0]) })
        })
    }

    fn embed_failing_on(word: &'static str) -> EmbedFn {
        Box::new(move |text: &str| -> EmbedFuture {
            let fail = text.contains(word);
            Box::pin(async move {
                if fail {
                    Err(LlmError::Unavailable("connection refused".into()))
                } else {
                    Ok(vec![1.0, 0.0])
                }
            })
        })
    }

    fn chunks(source: &str, pages: &[&[&str]]) -> Vec<Chunk> {
        let pages = (0u32..)
            .zip(pages)
            .map(|(page, texts)| PageChunks {
                metadata: DocumentMetadata::for_page(source, page),
                chunks: texts.iter().map(|t| (*t).to_owned()).collect(),
            })
            .collect();
        identify_pages(pages)
    }

    fn indexer(
        store: &Arc<InMemoryVectorStore>,
        embed_fn: EmbedFn,
        refresh: bool,
    ) -> IncrementalIndexer {
        let store: Arc<dyn VectorStore> = Arc::clone(store) as Arc<dyn VectorStore>;
        IncrementalIndexer::new(
            store,
            embed_fn,
            IndexerConfig {
                refresh_changed: refresh,
            },
        )
    }

    #[tokio::test]
    async fn first_run_adds_everything() {
        let store = Arc::new(InMemoryVectorStore::new());
        let chunks = chunks("data/a.pdf", &[&["alpha", "beta"], &["gamma"]]);

        let report = indexer(&store, embed_len(), false).index(&chunks).await.unwrap();
        assert_eq!(report.existing, 0);
        assert_eq!(report.candidates, 3);
        assert_eq!(report.added, 3);
        assert!(report.errors.is_empty());

        let ids = store.ids().await.unwrap();
        assert!(ids.contains("data/a.pdf:0:1"));
        assert!(ids.contains("data/a.pdf:1:0"));
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let store = Arc::new(InMemoryVectorStore::new());
        let chunks = chunks("data/a.pdf", &[&["alpha", "beta"]]);
        let indexer = indexer(&store, embed_len(), false);

        indexer.index(&chunks).await.unwrap();
        let report = indexer.index(&chunks).await.unwrap();
        assert_eq!(report.existing, 2);
        assert_eq!(report.added, 0);
        assert_eq!(report.unchanged, 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn only_new_chunks_are_embedded() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = indexer(&store, embed_len(), false);
        indexer
            .index(&chunks("data/a.pdf", &[&["alpha"]]))
            .await
            .unwrap();

        let report = indexer
            .index(&chunks("data/a.pdf", &[&["alpha", "beta"]]))
            .await
            .unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn empty_input_does_nothing() {
        let store = Arc::new(InMemoryVectorStore::new());
        let report = indexer(&store, embed_len(), false).index(&[]).await.unwrap();
        assert_eq!(report.added, 0);
        assert!(report.errors.is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stale_content_kept_without_refresh() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = indexer(&store, embed_len(), false);
        indexer.index(&chunks("data/a.pdf", &[&["old text"]])).await.unwrap();

        let report = indexer
            .index(&chunks("data/a.pdf", &[&["new text"]]))
            .await
            .unwrap();
        assert_eq!(report.refreshed, 0);
        let hits = store.search(vec![1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].text, "old text");
    }

    #[tokio::test]
    async fn changed_content_replaced_with_refresh() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = indexer(&store, embed_len(), true);
        indexer
            .index(&chunks("data/a.pdf", &[&["old text", "same"]]))
            .await
            .unwrap();

        let report = indexer
            .index(&chunks("data/a.pdf", &[&["new text", "same"]]))
            .await
            .unwrap();
        assert_eq!(report.refreshed, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.added, 0);

        let hashes = store.scroll_field("content_hash").await.unwrap();
        assert_eq!(
            hashes.get("data/a.pdf:0:0"),
            Some(&crate::document::content_hash("new text"))
        );
    }

    #[tokio::test]
    async fn embedding_failure_skips_chunk_and_continues() {
        let store = Arc::new(InMemoryVectorStore::new());
        let chunks = chunks("data/a.pdf", &[&["good one", "broken", "good two"]]);

        let report = indexer(&store, embed_failing_on("broken"), false)
            .index(&chunks)
            .await
            .unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("data/a.pdf:0:1"));
        assert!(!store.ids().await.unwrap().contains("data/a.pdf:0:1"));
    }

    #[tokio::test]
    async fn failed_chunk_is_retried_next_run() {
        let store = Arc::new(InMemoryVectorStore::new());
        let chunks = chunks("data/a.pdf", &[&["broken"]]);

        indexer(&store, embed_failing_on("broken"), false)
            .index(&chunks)
            .await
            .unwrap();
        let report = indexer(&store, embed_len(), false).index(&chunks).await.unwrap();
        assert_eq!(report.added, 1);
    }

    #[tokio::test]
    async fn duplicate_ids_in_one_run_are_reported() {
        let store = Arc::new(InMemoryVectorStore::new());
        let orphan = |text: &str| {
            identify_pages(vec![PageChunks {
                metadata: DocumentMetadata::default(),
                chunks: vec![text.to_owned()],
            }])
        };
        let mut chunks = orphan("first");
        chunks.extend(orphan("second"));

        let report = indexer(&store, embed_len(), false).index(&chunks).await.unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn record_metadata_carries_location_and_hash() {
        let chunks = chunks("data/a.pdf", &[&[], &["x", "y"]]);
        let record = chunk_to_record(&chunks[1], vec![0.1]);
        assert_eq!(record.id, "data/a.pdf:1:1");
        assert_eq!(record.metadata["source"], serde_json::json!("data/a.pdf"));
        assert_eq!(record.metadata["page"], serde_json::json!(1));
        assert_eq!(record.metadata["chunk_index"], serde_json::json!(1));
        assert_eq!(
            record.metadata["content_hash"],
            serde_json::json!(crate::document::content_hash("y"))
        );
    }

    #[test]
    fn index_report_defaults() {
        let report = IndexReport::default();
        assert_eq!(report.written(), 0);
        assert!(report.errors.is_empty());
    }
}
