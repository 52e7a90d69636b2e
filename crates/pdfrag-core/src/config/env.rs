use std::str::FromStr;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PDFRAG_DATA_DIR") {
            self.paths.data_dir = v.into();
        }
        if let Ok(v) = std::env::var("PDFRAG_STORE_DIR") {
            self.paths.store_dir = v.into();
        }
        if let Ok(v) = std::env::var("PDFRAG_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("PDFRAG_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("PDFRAG_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("PDFRAG_LLM_JUDGE_MODEL") {
            self.llm.judge_model = v;
        }
        if let Some(size) = parse_env("PDFRAG_CHUNK_SIZE") {
            self.splitter.chunk_size = size;
        }
        if let Some(overlap) = parse_env("PDFRAG_CHUNK_OVERLAP") {
            self.splitter.chunk_overlap = overlap;
        }
        if let Some(k) = parse_env("PDFRAG_TOP_K") {
            self.retrieval.top_k = k;
        }
        if let Some(enabled) = parse_env("PDFRAG_REFRESH_CHANGED") {
            self.ingest.refresh_changed = enabled;
        }
        if let Some(bytes) = parse_env("PDFRAG_MAX_FILE_SIZE") {
            self.ingest.max_file_size = bytes;
        }
    }
}

/// Typed value of `key`. Unset gives `None`; unparsable values are logged and give `None`.
pub(super) fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    if let Ok(value) = raw.parse() {
        Some(value)
    } else {
        tracing::warn!("ignoring invalid {key} value: {raw}");
        None
    }
}
