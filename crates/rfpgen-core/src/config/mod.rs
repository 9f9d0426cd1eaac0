mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            bail!(
                "generation.temperature must be within 0.0..=2.0, got {}",
                self.generation.temperature
            );
        }
        if self.corpus.top_k == 0 {
            bail!("corpus.top_k must be at least 1");
        }
        if self.corpus.collection.trim().is_empty() {
            bail!("corpus.collection must not be empty");
        }
        if self.gateway.max_body_size == 0 {
            bail!("gateway.max_body_size must be positive");
        }
        let limits = self.generation.max_tokens;
        for (name, value) in [
            ("executive_objective", limits.executive_objective),
            ("scope", limits.scope),
            ("resource_schedule", limits.resource_schedule),
            ("communication_plan", limits.communication_plan),
        ] {
            if value == 0 {
                bail!("generation.max_tokens.{name} must be positive");
            }
        }
        Ok(())
    }

    /// Key for the embedding endpoint, falling back to the chat key.
    #[must_use]
    pub fn embedding_api_key(&self) -> Option<&Secret> {
        self.secrets
            .embedding_api_key
            .as_ref()
            .or(self.secrets.llm_api_key.as_ref())
    }
}

/// Priority: explicit path (`--config`) > `RFPGEN_CONFIG` > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("RFPGEN_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
