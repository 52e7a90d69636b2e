//! Stable chunk identity.
//!
//! A chunk ID is `"{source}:{page}:{chunk_index}"` where `chunk_index` counts
//! chunks within one page starting at 0. IDs are the persisted record keys, so
//! the same file at the same path always produces the same IDs.

use std::collections::HashMap;
use std::fmt;

use super::types::{Chunk, DocumentMetadata, PageChunks};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(String);

impl ChunkId {
    #[must_use]
    pub fn new(page_key: &str, chunk_index: usize) -> Self {
        Self(format!("{page_key}:{chunk_index}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ChunkId> for String {
    fn from(id: ChunkId) -> Self {
        id.0
    }
}

/// Sequential ID assignment over a stream of chunks.
///
/// The index restarts at 0 whenever the page key differs from the previous
/// chunk's, so chunks of one page must arrive contiguously for IDs to be unique.
#[derive(Debug, Default)]
pub struct ChunkIdentifier {
    last_page_id: Option<String>,
    counter: usize,
}

impl ChunkIdentifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ID and in-page index for the next chunk of `metadata`'s page.
    pub fn next_id(&mut self, metadata: &DocumentMetadata) -> (ChunkId, usize) {
        let page_id = metadata.page_key();
        if self.last_page_id.as_deref() == Some(page_id.as_str()) {
            self.counter += 1;
        } else {
            self.counter = 0;
        }
        let id = ChunkId::new(&page_id, self.counter);
        self.last_page_id = Some(page_id);
        (id, self.counter)
    }
}

/// Assign IDs to per-page chunk groups.
///
/// Groups with the same page key are merged first (keeping first-appearance
/// order), so every page is contiguous by the time [`ChunkIdentifier`] runs.
#[must_use]
pub fn identify_pages(pages: Vec<PageChunks>) -> Vec<Chunk> {
    let mut identifier = ChunkIdentifier::new();
    let mut chunks = Vec::new();

    for page in coalesce_pages(pages) {
        for content in page.chunks {
            let (id, chunk_index) = identifier.next_id(&page.metadata);
            chunks.push(Chunk {
                id,
                content_hash: content_hash(&content),
                content,
                metadata: page.metadata.clone(),
                chunk_index,
            });
        }
    }

    chunks
}

fn coalesce_pages(pages: Vec<PageChunks>) -> Vec<PageChunks> {
    let mut merged: Vec<PageChunks> = Vec::with_capacity(pages.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for page in pages {
        let key = page.metadata.page_key();
        if let Some(&pos) = positions.get(&key) {
            merged[pos].chunks.extend(page.chunks);
        } else {
            positions.insert(key, merged.len());
            merged.push(page);
        }
    }

    merged
}

/// BLAKE3 hex digest used to detect content changes under an unchanged ID.
#[must_use]
pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}
