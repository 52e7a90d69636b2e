use std::path::{Path, PathBuf};

use super::super::{Document, DocumentError, DocumentLoader};

/// Result of loading every supported file in a directory.
///
/// A file that fails to load is reported in `failures` and does not stop the
/// remaining files from loading.
#[derive(Debug, Default)]
pub struct DirectoryLoad {
    pub documents: Vec<Document>,
    pub files_loaded: usize,
    pub failures: Vec<(PathBuf, DocumentError)>,
}

/// Loads the top-level files of a directory whose extension the inner loader supports.
///
/// Hidden files are skipped and files are visited in name order, so page
/// documents come out grouped by file and ordered by page.
pub struct DirectoryLoader {
    loader: Box<dyn DocumentLoader>,
}

impl DirectoryLoader {
    #[must_use]
    pub fn new(loader: Box<dyn DocumentLoader>) -> Self {
        Self { loader }
    }

    /// List the files this loader would read, in load order.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` does not exist or cannot be walked.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
        if !dir.is_dir() {
            return Err(DocumentError::MissingDirectory(dir.to_path_buf()));
        }

        let extensions = self.loader.supported_extensions();
        let mut files = Vec::new();
        for entry in ignore::WalkBuilder::new(dir)
            .standard_filters(false)
            .hidden(true)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build()
        {
            let entry = entry.map_err(|e| DocumentError::Walk(e.to_string()))?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let supported = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.iter().any(|s| s.eq_ignore_ascii_case(ext)));
            if supported {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Load every supported file under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the directory itself cannot be listed;
    /// per-file failures are collected in [`DirectoryLoad::failures`].
    pub async fn load_dir(&self, dir: &Path) -> Result<DirectoryLoad, DocumentError> {
        let files = self.discover(dir)?;
        let mut result = DirectoryLoad::default();

        for file in files {
            match self.loader.load(&file).await {
                Ok(docs) => {
                    tracing::debug!(file = %file.display(), pages = docs.len(), "loaded");
                    result.files_loaded += 1;
                    result.documents.extend(docs);
                }
                Err(e) => {
                    tracing::warn!(file = %file.display(), "failed to load document: {e}");
                    result.failures.push((file, e));
                }
            }
        }

        Ok(result)
    }
}
