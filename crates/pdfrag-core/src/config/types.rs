use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use pdfrag_memory::document::SplitterConfig;

use crate::eval::{EvalCase, default_cases};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub splitter: SplitterConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub eval: EvalConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("chroma")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Directory scanned for `*.pdf` files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Vector store directory; deleted wholesale on reset.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_dir: default_store_dir(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_model() -> String {
    "mistral".into()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Model grading answers in `pdfrag eval`.
    #[serde(default = "default_model")]
    pub judge_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            judge_model: default_model(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_max_file_size() -> u64 {
    pdfrag_memory::document::DEFAULT_MAX_FILE_SIZE
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Replace stored records whose text changed under the same chunk ID.
    #[serde(default)]
    pub refresh_changed: bool,
    /// PDFs larger than this many bytes are skipped.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            refresh_changed: false,
            max_file_size: default_max_file_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvalConfig {
    #[serde(default = "default_cases")]
    pub cases: Vec<EvalCase>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            cases: default_cases(),
        }
    }
}
