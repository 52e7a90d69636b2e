//! Populate the vector store: reset, load, split, identify, index.
//!
//! Every stage reports failures into [`IngestReport`] instead of aborting the
//! whole run, except where a later stage has nothing to work with.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use pdfrag_llm::EmbedFn;
use pdfrag_memory::document::{
    DirectoryLoader, DocumentLoader, PdfLoader, TextSplitter, identify_pages,
};
use pdfrag_memory::{
    IncrementalIndexer, IndexReport, IndexerConfig, ResetOutcome, SqliteVectorStore, VectorStore,
    reset_store,
};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reset,
    Load,
    Store,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reset => "reset",
            Self::Load => "load",
            Self::Store => "store",
        })
    }
}

#[derive(Debug, Clone)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    /// Set when a reset was requested and succeeded.
    pub reset: Option<ResetOutcome>,
    pub files_loaded: usize,
    pub pages: usize,
    pub chunks: usize,
    /// Absent when the store stage never ran to completion.
    pub index: Option<IndexReport>,
    pub failures: Vec<StageFailure>,
}

impl IngestReport {
    /// `true` when no stage and no chunk failed, whether or not anything was added.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.index.as_ref().is_none_or(|i| i.errors.is_empty())
    }

    #[must_use]
    pub fn added(&self) -> usize {
        self.index.as_ref().map_or(0, |i| i.added)
    }

    fn fail(&mut self, stage: Stage, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(%stage, "{message}");
        self.failures.push(StageFailure { stage, message });
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reset {
            Some(ResetOutcome::Removed) => writeln!(f, "Cleared existing store")?,
            Some(ResetOutcome::NotFound) => writeln!(f, "No existing store to clear")?,
            None => {}
        }
        writeln!(
            f,
            "Loaded {} file(s), {} page(s), {} chunk(s)",
            self.files_loaded, self.pages, self.chunks
        )?;
        if let Some(index) = &self.index {
            writeln!(
                f,
                "Store had {} record(s): {} added, {} refreshed, {} unchanged",
                index.existing, index.added, index.refreshed, index.unchanged
            )?;
            for error in &index.errors {
                writeln!(f, "  chunk error: {error}")?;
            }
        }
        for failure in &self.failures {
            writeln!(f, "  {} failed: {}", failure.stage, failure.message)?;
        }
        write!(f, "{}", if self.is_clean() { "Done" } else { "Done with errors" })
    }
}

pub struct Ingestor {
    data_dir: PathBuf,
    store_dir: PathBuf,
    loader: DirectoryLoader,
    splitter: TextSplitter,
    indexer_config: IndexerConfig,
    embed_fn: EmbedFn,
}

impl Ingestor {
    /// Ingestor reading PDFs from `config.paths.data_dir`.
    #[must_use]
    pub fn new(config: &Config, embed_fn: EmbedFn) -> Self {
        let pdf = PdfLoader {
            max_file_size: config.ingest.max_file_size,
        };
        Self::with_document_loader(config, Box::new(pdf), embed_fn)
    }

    #[must_use]
    pub fn with_document_loader(
        config: &Config,
        loader: Box<dyn DocumentLoader>,
        embed_fn: EmbedFn,
    ) -> Self {
        Self {
            data_dir: config.paths.data_dir.clone(),
            store_dir: config.paths.store_dir.clone(),
            loader: DirectoryLoader::new(loader),
            splitter: TextSplitter::new(config.splitter.clone()),
            indexer_config: IndexerConfig {
                refresh_changed: config.ingest.refresh_changed,
            },
            embed_fn,
        }
    }

    /// Run the pipeline once, optionally deleting the store first.
    pub async fn run(self, reset: bool) -> IngestReport {
        let mut report = IngestReport::default();

        if reset {
            tracing::info!("clearing database");
            match reset_store(&self.store_dir).await {
                Ok(outcome) => report.reset = Some(outcome),
                Err(e) => report.fail(
                    Stage::Reset,
                    format!("cannot remove {}: {e}", self.store_dir.display()),
                ),
            }
        }

        let documents = match self.loader.load_dir(&self.data_dir).await {
            Ok(load) => {
                for (path, e) in load.failures {
                    report.fail(Stage::Load, format!("{}: {e}", path.display()));
                }
                report.files_loaded = load.files_loaded;
                load.documents
            }
            Err(e) => {
                report.fail(Stage::Load, e.to_string());
                Vec::new()
            }
        };
        report.pages = documents.len();

        let chunks = identify_pages(self.splitter.split_all(&documents));
        report.chunks = chunks.len();
        tracing::info!(
            files = report.files_loaded,
            pages = report.pages,
            chunks = report.chunks,
            "split documents"
        );

        let store = match SqliteVectorStore::open(&self.store_dir).await {
            Ok(store) => store,
            Err(e) => {
                report.fail(Stage::Store, format!("cannot open store: {e}"));
                return report;
            }
        };

        let shared: Arc<dyn VectorStore> = Arc::new(store.clone());
        let indexer = IncrementalIndexer::new(shared, self.embed_fn, self.indexer_config);
        match indexer.index(&chunks).await {
            Ok(index) => report.index = Some(index),
            Err(e) => report.fail(Stage::Store, e.to_string()),
        }
        store.close().await;

        report
    }
}
