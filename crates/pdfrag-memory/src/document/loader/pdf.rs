use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata,
};

/// Loads a PDF as one [`Document`] per page, pages numbered from 0.
pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>> {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > max_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            // Not canonicalized: chunk IDs embed the path exactly as configured.
            let source = path.display().to_string();
            let bytes = tokio::fs::read(&path).await?;
            let pages = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem_by_pages(&bytes)
                    .map_err(|e| DocumentError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;

            tracing::debug!(source = %source, pages = pages.len(), "pdf loaded");

            let documents = (0u32..)
                .zip(pages)
                .map(|(page, content)| Document {
                    content,
                    metadata: DocumentMetadata::for_page(source.clone(), page),
                })
                .collect();
            Ok(documents)
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}
