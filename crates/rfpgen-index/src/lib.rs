//! Reference Store: similarity search over prior proposals.

pub mod corpus;
pub mod error;
pub mod in_memory_store;
pub mod manifest;
pub mod qdrant_ops;
pub mod reference;
pub mod vector_store;

pub use error::IndexError;
pub use in_memory_store::InMemoryVectorStore;
pub use manifest::IndexManifest;
pub use qdrant_ops::QdrantOps;
pub use reference::{EmbedFn, ReferenceStore, ReferenceStoreConfig, RetrievedContext, RetrievedEntry};
pub use vector_store::{ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
