//! Versioned reference index over the proposal corpus.
//!
//! A rebuild embeds the corpus into a fresh collection `<base>_v<N>`, persists
//! the manifest, and only then swaps the in-process pointer. Rebuilds are
//! serialized; a query holds the read side of the pointer lock for its whole
//! duration, so the collection it searches cannot be swapped out and dropped
//! underneath it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rfpgen_document::{DocumentLoader, FileLoader};
use rfpgen_llm::EmbedFuture;
use tokio::sync::{Mutex, RwLock};

use crate::corpus::load_corpus;
use crate::error::IndexError;
use crate::manifest::IndexManifest;
use crate::vector_store::{VectorPoint, VectorStore};

pub type EmbedFn = Box<dyn Fn(&str) -> EmbedFuture + Send + Sync>;

/// Where the corpus lives and where the index is kept.
#[derive(Debug, Clone)]
pub struct ReferenceStoreConfig {
    pub corpus_dir: PathBuf,
    pub persist_dir: PathBuf,
    /// Base collection name; versions are suffixed `_v<N>`.
    pub collection: String,
    /// Characters of each text sent to the embedding service; 0 = unlimited.
    pub embed_max_chars: usize,
}

/// One corpus document returned by a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedEntry {
    pub source_id: String,
    pub score: f32,
    pub text: String,
}

/// Top-k corpus texts, most similar first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub entries: Vec<RetrievedEntry>,
}

impl RetrievedContext {
    /// Entry texts joined by blank lines, in ranked order.
    #[must_use]
    pub fn joined(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ReferenceStore {
    store: Arc<dyn VectorStore>,
    embed_fn: EmbedFn,
    loader: Box<dyn DocumentLoader>,
    config: ReferenceStoreConfig,
    current: RwLock<Option<IndexManifest>>,
    rebuild_lock: Mutex<()>,
}

impl std::fmt::Debug for ReferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReferenceStore {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, embed_fn: EmbedFn, config: ReferenceStoreConfig) -> Self {
        Self {
            store,
            embed_fn,
            loader: Box::new(FileLoader::default()),
            config,
            current: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_loader(mut self, loader: Box<dyn DocumentLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Adopt the persisted index if its collection is still present in the store.
    ///
    /// A missing or unreadable manifest, or a manifest pointing at a vanished
    /// collection, leaves the store unbuilt.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector store cannot be reached.
    pub async fn open(&self) -> Result<Option<IndexManifest>, IndexError> {
        let manifest = match IndexManifest::load(&self.config.persist_dir).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("ignoring index manifest: {e}");
                None
            }
        };
        let Some(manifest) = manifest else {
            return Ok(None);
        };
        if !self.store.collection_exists(&manifest.collection).await? {
            tracing::info!(
                collection = %manifest.collection,
                "persisted index collection is gone, rebuild required"
            );
            return Ok(None);
        }
        tracing::info!(
            version = manifest.version,
            documents = manifest.documents.len(),
            "opened reference index"
        );
        *self.current.write().await = Some(manifest.clone());
        Ok(Some(manifest))
    }

    /// Manifest of the index queries currently run against.
    pub async fn current(&self) -> Option<IndexManifest> {
        self.current.read().await.clone()
    }

    /// Rebuild the index from the corpus folder and make it current.
    ///
    /// Concurrent calls run one after another. Queries keep using the previous
    /// version until the new one is complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus has no readable document, embedding
    /// fails, or the vector store rejects the new collection. The previous
    /// version stays current on failure.
    pub async fn rebuild(&self) -> Result<IndexManifest, IndexError> {
        let _guard = self.rebuild_lock.lock().await;

        let documents = load_corpus(&self.config.corpus_dir, self.loader.as_ref()).await?;

        let previous = self.current.read().await.clone();
        let persisted_version = IndexManifest::load(&self.config.persist_dir)
            .await
            .ok()
            .flatten()
            .map_or(0, |m| m.version);
        let version = previous
            .as_ref()
            .map_or(0, |m| m.version)
            .max(persisted_version)
            + 1;
        let collection = format!("{}_v{version}", self.config.collection);

        let mut points = Vec::with_capacity(documents.len());
        let mut vector_size = None;
        for doc in &documents {
            let vector = (self.embed_fn)(truncate_chars(&doc.content, self.config.embed_max_chars)).await?;
            let expected = *vector_size.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(IndexError::Dimension {
                    expected,
                    actual: vector.len(),
                    source_id: doc.metadata.source.clone(),
                });
            }
            points.push(VectorPoint {
                id: point_id(&collection, &doc.metadata.source),
                vector,
                payload: HashMap::from([
                    ("source".to_owned(), serde_json::json!(doc.metadata.source)),
                    ("text".to_owned(), serde_json::json!(doc.content)),
                ]),
            });
        }
        let vector_size = vector_size.unwrap_or_default() as u64;

        // A leftover from an interrupted build may occupy the name.
        if self.store.collection_exists(&collection).await? {
            self.store.delete_collection(&collection).await?;
        }
        self.store.ensure_collection(&collection, vector_size).await?;
        self.store.upsert(&collection, points).await?;

        let manifest = IndexManifest {
            version,
            collection: collection.clone(),
            vector_size,
            documents: documents.iter().map(|d| d.metadata.source.clone()).collect(),
            built_at_secs: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
        };
        manifest.store(&self.config.persist_dir).await?;

        let old = self.current.write().await.replace(manifest.clone());
        tracing::info!(
            version,
            collection = %collection,
            documents = manifest.documents.len(),
            "reference index swapped in"
        );

        if let Some(old) = old
            && old.collection != collection
            && let Err(e) = self.store.delete_collection(&old.collection).await
        {
            tracing::warn!(collection = %old.collection, "failed to drop previous index: {e}");
        }
        Ok(manifest)
    }

    /// The `k` corpus documents most similar to `text`, best first.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::NotBuilt` before the first successful rebuild or
    /// open, or an embedding/store error.
    pub async fn query(&self, text: &str, k: usize) -> Result<RetrievedContext, IndexError> {
        let current = self.current.read().await;
        let manifest = current.as_ref().ok_or(IndexError::NotBuilt)?;

        let vector = (self.embed_fn)(truncate_chars(text, self.config.embed_max_chars)).await?;
        let hits = self
            .store
            .search(&manifest.collection, vector, k as u64)
            .await?;

        let entries = hits
            .into_iter()
            .map(|hit| RetrievedEntry {
                source_id: payload_str(&hit.payload, "source"),
                score: hit.score,
                text: payload_str(&hit.payload, "text"),
            })
            .collect();
        Ok(RetrievedContext { entries })
    }
}

fn payload_str(payload: &HashMap<String, serde_json::Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn point_id(collection: &str, source: &str) -> String {
    uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        format!("{collection}/{source}").as_bytes(),
    )
    .to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return text;
    }
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
