use std::path::PathBuf;

use crate::vector_store::VectorStoreError;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("no readable PDF/DOCX documents in corpus folder {}", .0.display())]
    EmptyCorpus(PathBuf),

    #[error("cannot read corpus folder {}: {source}", .path.display())]
    Folder {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("reference index has not been built")]
    NotBuilt,

    #[error("embedding failed: {0}")]
    Embedding(#[from] rfpgen_llm::LlmError),

    #[error("embedding dimension mismatch: expected {expected}, got {actual} for {source_id}")]
    Dimension {
        expected: usize,
        actual: usize,
        source_id: String,
    },

    #[error("vector store error: {0}")]
    Store(#[from] VectorStoreError),

    #[error("manifest error: {0}")]
    Manifest(String),
}
