//! Application bootstrap: config resolution, provider/store/orchestrator construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use rfpgen_document::{DocumentAssembler, FileLoader};
use rfpgen_index::{InMemoryVectorStore, QdrantOps, ReferenceStore, ReferenceStoreConfig, VectorStore};
use rfpgen_llm::openai::{ApiFlavor, OpenAiProvider};
use rfpgen_llm::{AnyProvider, RetryPolicy};
use tokio::sync::mpsc;

use crate::config::{Config, ProviderKind, VectorBackend, resolve_config_path};
use crate::generator::SectionGenerator;
use crate::pipeline::{Orchestrator, PipelineOptions};

pub struct AppBuilder {
    config: Config,
    config_path: PathBuf,
}

impl AppBuilder {
    /// Resolve the config path, load and validate the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or invalid.
    pub fn load(cli_path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = resolve_config_path(cli_path);
        let config = Config::load(&config_path)?;
        config.validate()?;
        Ok(Self {
            config,
            config_path,
        })
    }

    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            config_path: PathBuf::new(),
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

    /// Chat provider plus the receiver for its retry notices.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured.
    pub fn build_provider(&self) -> anyhow::Result<(AnyProvider, mpsc::UnboundedReceiver<String>)> {
        let mut provider = create_chat_provider(&self.config)?;
        let (status_tx, status_rx) = mpsc::unbounded_channel::<String>();
        provider.set_status_tx(status_tx);
        Ok((provider, status_rx))
    }

    /// Reference store over the configured corpus, adopting a persisted index
    /// when one is still present in the vector store.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedding provider or vector store cannot be created.
    pub async fn build_reference_store(&self) -> anyhow::Result<ReferenceStore> {
        let embedder = create_embedding_provider(&self.config)?;
        let store = ReferenceStore::new(
            create_vector_store(&self.config)?,
            Box::new(embedder.embed_fn()),
            reference_store_config(&self.config),
        )
        .with_loader(Box::new(FileLoader {
            max_file_size: self.config.corpus.max_file_size,
        }));
        if let Err(e) = store.open().await {
            tracing::warn!("could not open persisted reference index: {e}");
        }
        Ok(store)
    }

    /// # Errors
    ///
    /// Returns an error if a provider or the reference store cannot be built.
    pub async fn build_orchestrator(
        &self,
        provider: AnyProvider,
    ) -> anyhow::Result<Orchestrator<AnyProvider>> {
        let references = Arc::new(self.build_reference_store().await?);
        Ok(Orchestrator::new(
            SectionGenerator::new(provider, self.config.generation.clone()),
            references,
            DocumentAssembler::new(self.config.template.styles.to_style_sheet()),
            pipeline_options(&self.config),
        ))
    }
}

fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy {
        request_timeout: Duration::from_secs(config.llm.timeout_secs),
        max_retries: config.llm.max_retries,
        backoff: Duration::from_millis(config.llm.retry_backoff_ms),
    }
}

fn flavor(kind: ProviderKind, api_version: &str) -> ApiFlavor {
    match kind {
        ProviderKind::OpenAi => ApiFlavor::OpenAi,
        ProviderKind::Azure => ApiFlavor::Azure {
            api_version: api_version.to_owned(),
        },
    }
}

/// # Errors
///
/// Returns an error if `RFPGEN_LLM_API_KEY` is not set.
pub fn create_chat_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let key = config
        .secrets
        .llm_api_key
        .as_ref()
        .context("RFPGEN_LLM_API_KEY is not set")?;
    let provider = OpenAiProvider::new(
        key.expose().to_owned(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        None,
    )
    .with_flavor(flavor(config.llm.provider, &config.llm.api_version))
    .with_retry(retry_policy(config));
    tracing::info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        "chat provider configured"
    );
    Ok(AnyProvider::OpenAi(provider))
}

/// Embedding calls go to their own endpoint and deployment; the chat model
/// slot doubles as the Azure deployment name.
///
/// # Errors
///
/// Returns an error if neither embedding nor chat API key is set.
pub fn create_embedding_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let key = config
        .embedding_api_key()
        .context("RFPGEN_EMBEDDING_API_KEY (or RFPGEN_LLM_API_KEY) is not set")?;
    let policy = RetryPolicy {
        request_timeout: Duration::from_secs(config.embedding.timeout_secs),
        ..retry_policy(config)
    };
    let provider = OpenAiProvider::new(
        key.expose().to_owned(),
        config.embedding.base_url.clone(),
        config.embedding.model.clone(),
        Some(config.embedding.model.clone()),
    )
    .with_flavor(flavor(config.embedding.provider, &config.embedding.api_version))
    .with_retry(policy);
    Ok(AnyProvider::OpenAi(provider))
}

/// # Errors
///
/// Returns an error if the Qdrant client cannot be created.
pub fn create_vector_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    match config.corpus.backend {
        VectorBackend::Memory => Ok(Arc::new(InMemoryVectorStore::new())),
        VectorBackend::Qdrant => {
            let ops = QdrantOps::new(&config.corpus.qdrant_url).map_err(|e| {
                anyhow!("failed to connect to Qdrant at {}: {e}", config.corpus.qdrant_url)
            })?;
            Ok(Arc::new(ops))
        }
    }
}

#[must_use]
pub fn reference_store_config(config: &Config) -> ReferenceStoreConfig {
    ReferenceStoreConfig {
        corpus_dir: config.corpus.folder.clone(),
        persist_dir: config.corpus.persist_dir.clone(),
        collection: config.corpus.collection.clone(),
        embed_max_chars: config.corpus.embed_max_chars,
    }
}

#[must_use]
pub fn pipeline_options(config: &Config) -> PipelineOptions {
    PipelineOptions {
        min_text_chars: config.pipeline.min_text_chars,
        top_k: config.corpus.top_k,
        rebuild_on_request: config.corpus.rebuild_on_request,
        template_path: config.template.path.clone(),
        output_prefix: config.template.output_prefix.clone(),
    }
}
