//! Wiring from [`Config`] to runnable components.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use pdfrag_llm::any::AnyProvider;
use pdfrag_llm::ollama::OllamaProvider;
use pdfrag_llm::{LlmError, LlmProvider};
use pdfrag_memory::{SqliteVectorStore, VectorStore};

use crate::config::Config;
use crate::ingest::Ingestor;
use crate::query::RagPipeline;

pub struct AppBuilder {
    config: Config,
    config_path: PathBuf,
}

impl AppBuilder {
    /// Resolve the config path and load it.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be parsed or is invalid.
    pub fn from_cli(cli_path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = resolve_config_path(cli_path);
        let config = Config::load(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?;
        Ok(Self::new(config, config_path))
    }

    #[must_use]
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Answering model with the configured embedding model.
    pub async fn build_provider(&self) -> AnyProvider {
        let provider = self.ollama(self.config.llm.model.clone());
        health_check(&provider).await;
        provider
    }

    /// Judge model for `eval`; shares the endpoint and embedding model.
    #[must_use]
    pub fn build_judge(&self) -> AnyProvider {
        self.ollama(self.config.llm.judge_model.clone())
    }

    /// # Errors
    ///
    /// Returns an error if `provider` cannot compute embeddings.
    pub fn build_ingestor(&self, provider: &AnyProvider) -> anyhow::Result<Ingestor> {
        require_embeddings(provider)?;
        Ok(Ingestor::new(&self.config, provider.embed_fn()))
    }

    /// # Errors
    ///
    /// Returns an error if `provider` cannot compute embeddings or the store
    /// directory cannot be opened.
    pub async fn build_pipeline(
        &self,
        provider: AnyProvider,
    ) -> anyhow::Result<RagPipeline<AnyProvider>> {
        require_embeddings(&provider)?;
        let store = SqliteVectorStore::open(&self.config.paths.store_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to open vector store at {}",
                    self.config.paths.store_dir.display()
                )
            })?;
        let store: Arc<dyn VectorStore> = Arc::new(store);
        let embed_fn = provider.embed_fn();
        Ok(RagPipeline::new(
            store,
            embed_fn,
            provider,
            self.config.retrieval.top_k,
        ))
    }

    fn ollama(&self, model: String) -> AnyProvider {
        AnyProvider::Ollama(OllamaProvider::new(
            &self.config.llm.base_url,
            model,
            self.config.llm.embedding_model.clone(),
        ))
    }
}

fn require_embeddings(provider: &AnyProvider) -> Result<(), LlmError> {
    if provider.supports_embeddings() {
        Ok(())
    } else {
        Err(LlmError::EmbedUnsupported {
            provider: provider.name().to_owned(),
        })
    }
}

/// Priority: `--config` > `PDFRAG_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("PDFRAG_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

pub async fn health_check(provider: &AnyProvider) {
    #[allow(unreachable_patterns)]
    match provider {
        AnyProvider::Ollama(ollama) => match ollama.health_check().await {
            Ok(()) => tracing::info!("ollama health check passed"),
            Err(e) => tracing::warn!("ollama health check failed: {e:#}"),
        },
        _ => {}
    }
}
