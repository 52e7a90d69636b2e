use std::collections::{HashMap, HashSet};

use super::SqliteVectorStore;
use crate::vector_store::{
    BoxFuture, ScoredRecord, VectorRecord, VectorStore, VectorStoreError, rank, score,
};

type Metadata = HashMap<String, serde_json::Value>;

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn encode_metadata(metadata: &Metadata) -> Result<String, VectorStoreError> {
    serde_json::to_string(metadata).map_err(|e| VectorStoreError::Serialization(e.to_string()))
}

impl SqliteVectorStore {
    async fn write_records(&self, records: Vec<VectorRecord>, replace: bool) -> Result<(), String> {
        let sql = if replace {
            "INSERT INTO records (id, text, embedding, metadata) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET text = excluded.text, \
             embedding = excluded.embedding, metadata = excluded.metadata"
        } else {
            "INSERT INTO records (id, text, embedding, metadata) VALUES (?, ?, ?, ?)"
        };

        let mut tx = self.pool.begin().await.map_err(|e| e.to_string())?;
        for record in records {
            let metadata = encode_metadata(&record.metadata).map_err(|e| e.to_string())?;
            sqlx::query(sql)
                .bind(&record.id)
                .bind(&record.text)
                .bind(encode_embedding(&record.embedding))
                .bind(metadata)
                .execute(&mut *tx)
                .await
                .map_err(|e| format!("{}: {e}", record.id))?;
        }
        tx.commit().await.map_err(|e| e.to_string())
    }
}

impl VectorStore for SqliteVectorStore {
    fn ids(&self) -> BoxFuture<'_, Result<HashSet<String>, VectorStoreError>> {
        Box::pin(async move {
            let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM records")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| VectorStoreError::Scroll(e.to_string()))?;
            Ok(rows.into_iter().map(|(id,)| id).collect())
        })
    }

    fn scroll_field(
        &self,
        field: &str,
    ) -> BoxFuture<'_, Result<HashMap<String, String>, VectorStoreError>> {
        let path = format!("$.\"{field}\"");
        Box::pin(async move {
            let rows: Vec<(String, String)> = sqlx::query_as(
                "SELECT id, json_extract(metadata, ?1) FROM records \
                 WHERE json_type(metadata, ?1) = 'text'",
            )
            .bind(&path)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| VectorStoreError::Scroll(e.to_string()))?;
            Ok(rows.into_iter().collect())
        })
    }

    fn insert(&self, records: Vec<VectorRecord>) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            self.write_records(records, false)
                .await
                .map_err(VectorStoreError::Insert)
        })
    }

    fn upsert(&self, records: Vec<VectorRecord>) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            self.write_records(records, true)
                .await
                .map_err(VectorStoreError::Upsert)
        })
    }

    fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ScoredRecord>, VectorStoreError>> {
        Box::pin(async move {
            let rows: Vec<(String, String, Vec<u8>, String)> =
                sqlx::query_as("SELECT id, text, embedding, metadata FROM records")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| VectorStoreError::Search(e.to_string()))?;

            let mut scored = Vec::with_capacity(rows.len());
            for (id, text, embedding, metadata) in rows {
                let metadata: Metadata = serde_json::from_str(&metadata)
                    .map_err(|e| VectorStoreError::Serialization(format!("{id}: {e}")))?;
                scored.push(ScoredRecord {
                    score: score(&id, &vector, &decode_embedding(&embedding))?,
                    id,
                    text,
                    metadata,
                });
            }
            Ok(rank(scored, limit))
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<usize, VectorStoreError>> {
        Box::pin(async move {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| VectorStoreError::Scroll(e.to_string()))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }

    fn persist(&self) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
                .execute(&self.pool)
                .await
                .map_err(|e| VectorStoreError::Persist(e.to_string()))?;
            Ok(())
        })
    }
}
