use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Removed,
    /// Nothing existed at the path.
    NotFound,
}

/// Delete the store directory and everything in it.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be removed.
pub async fn reset_store(dir: &Path) -> io::Result<ResetOutcome> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            tracing::info!(dir = %dir.display(), "cleared vector store");
            Ok(ResetOutcome::Removed)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "no vector store to clear");
            Ok(ResetOutcome::NotFound)
        }
        Err(e) => Err(e),
    }
}
