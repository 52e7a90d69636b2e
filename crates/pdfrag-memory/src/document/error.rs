use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("directory walk failed: {0}")]
    Walk(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[error("PDF error: {0}")]
    Pdf(String),
}
