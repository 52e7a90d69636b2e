mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting values fail [`Config::validate`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.splitter.chunk_size == 0 {
            bail!("splitter.chunk_size must be greater than 0");
        }
        if self.splitter.chunk_overlap >= self.splitter.chunk_size {
            bail!(
                "splitter.chunk_overlap ({}) must be smaller than splitter.chunk_size ({})",
                self.splitter.chunk_overlap,
                self.splitter.chunk_size
            );
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be greater than 0");
        }
        Ok(())
    }
}
