use std::collections::HashMap;
use std::sync::RwLock;

use crate::vector_store::{BoxFuture, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};

struct StoredPoint {
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

struct InMemoryCollection {
    points: HashMap<String, StoredPoint>,
}

/// Process-local vector store. Contents are lost on restart.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore").finish_non_exhaustive()
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        _vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.entry(collection).or_insert_with(|| InMemoryCollection {
                points: HashMap::new(),
            });
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols.contains_key(&collection))
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.remove(&collection);
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            for p in points {
                col.points.insert(
                    p.id,
                    StoredPoint {
                        vector: p.vector,
                        payload: p.payload,
                    },
                );
            }
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;

            let mut scored: Vec<ScoredVectorPoint> = col
                .points
                .iter()
                .map(|(id, sp)| ScoredVectorPoint {
                    id: id.clone(),
                    score: cosine_similarity(&vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            // Ties broken by id so results are stable across runs.
            scored.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
            scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, vector: Vec<f32>) -> VectorPoint {
        VectorPoint {
            id: id.into(),
            vector,
            payload: HashMap::from([("source".to_owned(), serde_json::json!(id))]),
        }
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2).await.unwrap();
        store
            .upsert(
                "c",
                vec![
                    point("far", vec![0.0, 1.0]),
                    point("near", vec![1.0, 0.1]),
                    point("mid", vec![1.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let hits = store.search("c", vec![1.0, 0.0], 2).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert!(hits[0].score >= hits[1].score);
        assert_eq!(hits[0].payload["source"], "near");
    }

    #[tokio::test]
    async fn collection_lifecycle() {
        let store = InMemoryVectorStore::new();
        assert!(!store.collection_exists("c").await.unwrap());
        store.ensure_collection("c", 3).await.unwrap();
        assert!(store.collection_exists("c").await.unwrap());
        store.delete_collection("c").await.unwrap();
        assert!(!store.collection_exists("c").await.unwrap());
    }

    #[tokio::test]
    async fn upsert_into_missing_collection_fails() {
        let store = InMemoryVectorStore::new();
        let result = store.upsert("missing", vec![point("a", vec![1.0])]).await;
        assert!(matches!(result, Err(VectorStoreError::Upsert(_))));
        assert!(matches!(
            store.search("missing", vec![1.0], 1).await,
            Err(VectorStoreError::Search(_))
        ));
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f32::EPSILON);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cosine_is_bounded(
            a in proptest::collection::vec(-100.0f32..100.0, 4),
            b in proptest::collection::vec(-100.0f32..100.0, 4),
        ) {
            let s = cosine_similarity(&a, &b);
            prop_assert!((-1.0001..=1.0001).contains(&s));
        }
    }
}
