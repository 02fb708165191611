use std::collections::HashMap;
use std::sync::RwLock;

use crate::vector_store::{
    BoxFuture, DistanceMetric, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError,
};

struct StoredPoint {
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

struct InMemoryCollection {
    vector_size: usize,
    metric: DistanceMetric,
    points: HashMap<String, StoredPoint>,
}

/// Process-local [`VectorStore`] used for tests and `backend = "memory"` runs.
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
        f.debug_struct("InMemoryVectorStore")
            .finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn score(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => cosine_similarity(a, b),
        DistanceMetric::Dot => dot_product(a, b),
        // Negated so that higher is always closer.
        DistanceMetric::Euclid => -a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
        metric: DistanceMetric,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let vector_size = usize::try_from(vector_size)
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.entry(collection)
                .or_insert_with(|| InMemoryCollection {
                    vector_size,
                    metric,
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
            if let Some(bad) = points.iter().find(|p| p.vector.len() != col.vector_size) {
                return Err(VectorStoreError::Upsert(format!(
                    "point {} has {} dimensions, collection {collection} expects {}",
                    bad.id,
                    bad.vector.len(),
                    col.vector_size
                )));
            }
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
                    score: score(col.metric, &vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            scored.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }

    fn delete_all(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Delete(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Delete(format!("collection {collection} not found"))
            })?;
            col.points.clear();
            Ok(())
        })
    }

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Count(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Count(format!("collection {collection} not found"))
            })?;
            Ok(col.points.len() as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn point(id: &str, vector: Vec<f32>, text: &str) -> VectorPoint {
        VectorPoint {
            id: id.to_owned(),
            vector,
            payload: HashMap::from([("text".to_owned(), serde_json::json!(text))]),
        }
    }

    async fn store_with(points: Vec<VectorPoint>) -> InMemoryVectorStore {
        let store = InMemoryVectorStore::new();
        store
            .ensure_collection("kb", 3, DistanceMetric::Cosine)
            .await
            .unwrap();
        store.upsert("kb", points).await.unwrap();
        store
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let store = InMemoryVectorStore::new();
        assert!(!store.collection_exists("kb").await.unwrap());
        store
            .ensure_collection("kb", 3, DistanceMetric::Cosine)
            .await
            .unwrap();
        store
            .upsert("kb", vec![point("a", vec![1.0, 0.0, 0.0], "a")])
            .await
            .unwrap();
        store
            .ensure_collection("kb", 3, DistanceMetric::Cosine)
            .await
            .unwrap();
        assert!(store.collection_exists("kb").await.unwrap());
        assert_eq!(store.count("kb").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let store = store_with(vec![point("a", vec![1.0, 0.0, 0.0], "old")]).await;
        store
            .upsert("kb", vec![point("a", vec![0.0, 1.0, 0.0], "new")])
            .await
            .unwrap();
        assert_eq!(store.count("kb").await.unwrap(), 1);
        let hits = store.search("kb", vec![0.0, 1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits[0].text(), Some("new"));
    }

    #[tokio::test]
    async fn upsert_rejects_wrong_dimensions() {
        let store = store_with(Vec::new()).await;
        let err = store
            .upsert("kb", vec![point("a", vec![1.0, 0.0], "short")])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::Upsert(_)));
        assert_eq!(store.count("kb").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upsert_missing_collection_fails() {
        let store = InMemoryVectorStore::new();
        let result = store
            .upsert("nope", vec![point("a", vec![1.0, 0.0, 0.0], "a")])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn search_ranks_descending_and_truncates() {
        let store = store_with(vec![
            point("far", vec![0.0, 0.0, 1.0], "far"),
            point("near", vec![1.0, 0.1, 0.0], "near"),
            point("mid", vec![1.0, 1.0, 0.0], "mid"),
        ])
        .await;

        let hits = store.search("kb", vec![1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "near");
        assert_eq!(hits[1].id, "mid");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn delete_all_empties_collection() {
        let store = store_with(vec![
            point("a", vec![1.0, 0.0, 0.0], "a"),
            point("b", vec![0.0, 1.0, 0.0], "b"),
        ])
        .await;
        store.delete_all("kb").await.unwrap();
        assert_eq!(store.count("kb").await.unwrap(), 0);
        assert!(store.collection_exists("kb").await.unwrap());
        let hits = store.search("kb", vec![1.0, 0.0, 0.0], 15).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn euclid_scores_closer_points_higher() {
        let store = InMemoryVectorStore::new();
        store
            .ensure_collection("kb", 2, DistanceMetric::Euclid)
            .await
            .unwrap();
        store
            .upsert(
                "kb",
                vec![
                    point("near", vec![1.0, 1.0], "near"),
                    point("far", vec![5.0, 5.0], "far"),
                ],
            )
            .await
            .unwrap();
        let hits = store.search("kb", vec![0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].id, "near");
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }

    proptest! {
        #[test]
        fn search_results_never_increase_in_score(
            vectors in proptest::collection::vec(proptest::collection::vec(-1.0f32..1.0, 3), 1..40),
            query in proptest::collection::vec(-1.0f32..1.0, 3),
            limit in 1u64..50,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let hits = rt.block_on(async {
                let points = vectors
                    .iter()
                    .enumerate()
                    .map(|(i, v)| point(&i.to_string(), v.clone(), "t"))
                    .collect();
                let store = store_with(points).await;
                store.search("kb", query.clone(), limit).await.unwrap()
            });
            prop_assert!(hits.len() as u64 <= limit);
            prop_assert!(hits.len() <= vectors.len());
            for pair in hits.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
    }
}
