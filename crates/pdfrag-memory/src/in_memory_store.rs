use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::vector_store::{
    BoxFuture, ScoredRecord, VectorRecord, VectorStore, VectorStoreError, rank, score,
};

struct StoredRecord {
    embedding: Vec<f32>,
    text: String,
    metadata: HashMap<String, serde_json::Value>,
}

/// Non-persistent store, mainly for tests.
pub struct InMemoryVectorStore {
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore").finish_non_exhaustive()
    }
}

impl VectorStore for InMemoryVectorStore {
    fn ids(&self) -> BoxFuture<'_, Result<HashSet<String>, VectorStoreError>> {
        Box::pin(async move {
            let records = self
                .records
                .read()
                .map_err(|e| VectorStoreError::Scroll(e.to_string()))?;
            Ok(records.keys().cloned().collect())
        })
    }

    fn scroll_field(
        &self,
        field: &str,
    ) -> BoxFuture<'_, Result<HashMap<String, String>, VectorStoreError>> {
        let field = field.to_owned();
        Box::pin(async move {
            let records = self
                .records
                .read()
                .map_err(|e| VectorStoreError::Scroll(e.to_string()))?;
            Ok(records
                .iter()
                .filter_map(|(id, r)| {
                    r.metadata
                        .get(&field)
                        .and_then(|v| v.as_str())
                        .map(|v| (id.clone(), v.to_owned()))
                })
                .collect())
        })
    }

    fn insert(&self, records: Vec<VectorRecord>) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            let mut stored = self
                .records
                .write()
                .map_err(|e| VectorStoreError::Insert(e.to_string()))?;
            let mut batch = HashSet::with_capacity(records.len());
            if let Some(dup) = records
                .iter()
                .find(|r| stored.contains_key(&r.id) || !batch.insert(r.id.as_str()))
            {
                return Err(VectorStoreError::Insert(format!("id {} already exists", dup.id)));
            }
            for r in records {
                stored.insert(
                    r.id,
                    StoredRecord {
                        embedding: r.embedding,
                        text: r.text,
                        metadata: r.metadata,
                    },
                );
            }
            Ok(())
        })
    }

    fn upsert(&self, records: Vec<VectorRecord>) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            let mut stored = self
                .records
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            for r in records {
                stored.insert(
                    r.id,
                    StoredRecord {
                        embedding: r.embedding,
                        text: r.text,
                        metadata: r.metadata,
                    },
                );
            }
            Ok(())
        })
    }

    fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ScoredRecord>, VectorStoreError>> {
        Box::pin(async move {
            let stored = self
                .records
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let scored = stored
                .iter()
                .map(|(id, r)| -> Result<ScoredRecord, VectorStoreError> {
                    Ok(ScoredRecord {
                        score: score(id, &vector, &r.embedding)?,
                        id: id.clone(),
                        text: r.text.clone(),
                        metadata: r.metadata.clone(),
                    })
                })
                .collect::<Result<Vec<_>, VectorStoreError>>()?;
            Ok(rank(scored, limit))
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<usize, VectorStoreError>> {
        Box::pin(async move {
            let stored = self
                .records
                .read()
                .map_err(|e| VectorStoreError::Scroll(e.to_string()))?;
            Ok(stored.len())
        })
    }

    fn persist(&self) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async { Ok(()) })
    }
}
