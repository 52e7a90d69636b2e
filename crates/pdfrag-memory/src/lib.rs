//! Document ingestion primitives and the persistent vector store.
//!
//! PDF pages are loaded into [`document::Document`]s, split into per-page
//! [`document::PageChunks`], given stable IDs by [`document::identify_pages`],
//! and written by the [`indexer::IncrementalIndexer`] into a [`VectorStore`]
//! that only ever receives chunks it has not seen before.

pub mod document;
pub mod error;
pub mod in_memory_store;
pub mod indexer;
pub mod reset;
pub mod sqlite;
pub mod vector_store;

pub use error::MemoryError;
pub use in_memory_store::InMemoryVectorStore;
pub use indexer::{IncrementalIndexer, IndexReport, IndexerConfig};
pub use reset::{ResetOutcome, reset_store};
pub use sqlite::SqliteVectorStore;
pub use vector_store::{ScoredRecord, VectorRecord, VectorStore, VectorStoreError};
