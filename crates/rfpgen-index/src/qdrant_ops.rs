//! Qdrant-backed [`VectorStore`].

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, value::Kind,
};

use crate::vector_store::{BoxFuture, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};

type QdrantResult<T> = Result<T, Box<qdrant_client::QdrantError>>;

/// Thin wrapper over [`Qdrant`] client encapsulating the collection operations
/// the reference index needs.
#[derive(Clone)]
pub struct QdrantOps {
    client: Qdrant,
}

impl std::fmt::Debug for QdrantOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantOps").finish_non_exhaustive()
    }
}

impl QdrantOps {
    /// Create a new `QdrantOps` connected to the given URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn new(url: &str) -> QdrantResult<Self> {
        let client = Qdrant::from_url(url).build().map_err(Box::new)?;
        Ok(Self { client })
    }

    /// Ensure a collection exists with cosine distance vectors.
    ///
    /// Idempotent: no-op if the collection already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if Qdrant cannot be reached or collection creation fails.
    pub async fn ensure_collection(&self, collection: &str, vector_size: u64) -> QdrantResult<()> {
        if self.collection_exists(collection).await? {
            return Ok(());
        }
        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
            )
            .await
            .map_err(Box::new)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if Qdrant cannot be reached.
    pub async fn collection_exists(&self, collection: &str) -> QdrantResult<bool> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(Box::new)
    }

    /// # Errors
    ///
    /// Returns an error if the collection cannot be deleted.
    pub async fn delete_collection(&self, collection: &str) -> QdrantResult<()> {
        self.client
            .delete_collection(collection)
            .await
            .map_err(Box::new)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> QdrantResult<()> {
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Box::new)?;
        Ok(())
    }

    /// Search for similar vectors, returning scored points with payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails.
    pub async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> QdrantResult<Vec<ScoredPoint>> {
        let builder = SearchPointsBuilder::new(collection, vector, limit).with_payload(true);
        let results = self.client.search_points(builder).await.map_err(Box::new)?;
        Ok(results.result)
    }
}

impl VectorStore for QdrantOps {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.ensure_collection(&collection, vector_size)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.collection_exists(&collection)
                .await
                .map_err(|e| VectorStoreError::Connection(e.to_string()))
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.delete_collection(&collection)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut qdrant_points = Vec::with_capacity(points.len());
            for p in points {
                let payload: HashMap<String, qdrant_client::qdrant::Value> =
                    serde_json::from_value(serde_json::Value::Object(
                        p.payload.into_iter().collect(),
                    ))
                    .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
                qdrant_points.push(PointStruct::new(p.id, p.vector, payload));
            }
            self.upsert(&collection, qdrant_points)
                .await
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))
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
            let results = self
                .search(&collection, vector, limit)
                .await
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            Ok(results.into_iter().map(scored_point_to_vector).collect())
        })
    }
}

fn scored_point_to_vector(point: ScoredPoint) -> ScoredVectorPoint {
    let payload: HashMap<String, serde_json::Value> = point
        .payload
        .into_iter()
        .filter_map(|(k, v)| {
            let json_val = match v.kind? {
                Kind::StringValue(s) => serde_json::Value::String(s),
                Kind::IntegerValue(i) => serde_json::Value::Number(i.into()),
                Kind::DoubleValue(d) => {
                    serde_json::Number::from_f64(d).map(serde_json::Value::Number)?
                }
                Kind::BoolValue(b) => serde_json::Value::Bool(b),
                _ => return None,
            };
            Some((k, json_val))
        })
        .collect();

    let id = match point.id.and_then(|pid| pid.point_id_options) {
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u)) => u,
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    };

    ScoredVectorPoint {
        id,
        score: point.score,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use qdrant_client::qdrant::{PointId, Value};

    use super::*;

    #[test]
    fn new_valid_url() {
        assert!(QdrantOps::new("http://localhost:6334").is_ok());
    }

    #[test]
    fn new_invalid_url() {
        assert!(QdrantOps::new("not a valid url").is_err());
    }

    #[test]
    fn scored_point_conversion_keeps_scalar_payload() {
        let point = ScoredPoint {
            id: Some(PointId::from("5f0b6c1e-1111-4222-8333-444455556666".to_owned())),
            score: 0.75,
            payload: HashMap::from([
                ("source".to_owned(), Value::from("Proposal A.docx")),
                ("chars".to_owned(), Value::from(1200_i64)),
            ]),
            ..ScoredPoint::default()
        };
        let converted = scored_point_to_vector(point);
        assert_eq!(converted.id, "5f0b6c1e-1111-4222-8333-444455556666");
        assert!((converted.score - 0.75).abs() < f32::EPSILON);
        assert_eq!(converted.payload["source"], "Proposal A.docx");
        assert_eq!(converted.payload["chars"], 1200);
    }
}
