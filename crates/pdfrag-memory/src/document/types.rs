use super::ids::ChunkId;

/// Token rendered in place of a missing `source` or `page`.
pub const MISSING_FIELD: &str = "None";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub source: Option<String>,
    /// 0-based page number within `source`.
    pub page: Option<u32>,
    pub content_type: String,
}

impl DocumentMetadata {
    #[must_use]
    pub fn for_page(source: impl Into<String>, page: u32) -> Self {
        Self {
            source: Some(source.into()),
            page: Some(page),
            content_type: "application/pdf".to_owned(),
        }
    }

    /// `"{source}:{page}"`, the prefix shared by every chunk ID of this page.
    #[must_use]
    pub fn page_key(&self) -> String {
        let source = self.source.as_deref().unwrap_or(MISSING_FIELD);
        match self.page {
            Some(page) => format!("{source}:{page}"),
            None => format!("{source}:{MISSING_FIELD}"),
        }
    }
}

/// One page of a source file.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Splitter output for a single page, in intra-page order.
#[derive(Debug, Clone)]
pub struct PageChunks {
    pub metadata: DocumentMetadata,
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: ChunkId,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub chunk_index: usize,
    /// BLAKE3 hex digest of `content`.
    pub content_hash: String,
}
