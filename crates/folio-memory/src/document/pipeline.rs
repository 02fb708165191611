use std::sync::Arc;
use std::time::Duration;

use folio_llm::provider::EmbedBatchFuture;
use uuid::Uuid;

use super::{Document, DocumentError};
use crate::vector_store::{DistanceMetric, VectorPoint, VectorStore, VectorStoreError};

/// Type-erased batch embedder, usually a closure over an `LlmProvider`.
pub type EmbedBatchFn = Box<dyn Fn(Vec<String>) -> EmbedBatchFuture + Send + Sync>;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub vector_size: u64,
    pub metric: DistanceMetric,
    pub batch_size: usize,
    /// Pause between consecutive batches; not applied after the last one.
    pub batch_delay: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            vector_size: 768,
            metric: DistanceMetric::Cosine,
            batch_size: 5,
            batch_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub batches: usize,
    pub upserted: usize,
    pub dropped: usize,
}

/// Resets a collection and refills it from a document set, one batch at a time.
pub struct IngestionPipeline {
    store: Arc<dyn VectorStore>,
    collection: String,
    config: IngestConfig,
    embed_fn: EmbedBatchFn,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        config: IngestConfig,
        embed_fn: EmbedBatchFn,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            config,
            embed_fn,
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Clear the collection, then embed and store `documents`.
    ///
    /// Batches run strictly in order. Vectors whose length differs from the
    /// configured size are dropped. On failure, records from earlier batches
    /// remain stored and the error reports how many.
    ///
    /// # Errors
    ///
    /// Returns an error if provisioning, clearing, embedding, or upserting fails.
    pub async fn ingest(&self, documents: Vec<Document>) -> Result<IngestReport, DocumentError> {
        let storage = |committed, source| DocumentError::Storage { committed, source };

        self.store
            .ensure_collection(&self.collection, self.config.vector_size, self.config.metric)
            .await
            .map_err(|e| storage(0, e))?;
        self.store
            .delete_all(&self.collection)
            .await
            .map_err(|e| storage(0, e))?;

        let mut report = IngestReport {
            documents: documents.len(),
            ..IngestReport::default()
        };
        let batch_size = self.config.batch_size.max(1);
        let total_batches = documents.len().div_ceil(batch_size);

        for (index, batch) in documents.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let vectors = (self.embed_fn)(texts)
                .await
                .map_err(|source| DocumentError::Embedding {
                    committed: report.upserted,
                    source,
                })?;

            let (points, dropped) = self
                .build_points(batch, vectors)
                .map_err(|e| storage(report.upserted, e))?;

            if dropped > 0 {
                tracing::warn!(
                    batch = index,
                    dropped,
                    expected = self.config.vector_size,
                    "dropping records with wrong vector dimensions"
                );
            }

            let valid = points.len();
            if valid > 0 {
                self.store
                    .upsert(&self.collection, points)
                    .await
                    .map_err(|e| storage(report.upserted, e))?;
            }

            report.batches += 1;
            report.upserted += valid;
            report.dropped += dropped;
            tracing::debug!(
                batch = index,
                total_batches,
                upserted = valid,
                "batch stored"
            );

            if index + 1 < total_batches && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        tracing::info!(
            collection = %self.collection,
            documents = report.documents,
            batches = report.batches,
            upserted = report.upserted,
            dropped = report.dropped,
            "ingestion complete"
        );
        Ok(report)
    }

    /// Pair each document with its vector by position. Documents without a
    /// vector, or with one of the wrong length, are counted as dropped.
    fn build_points(
        &self,
        batch: &[Document],
        vectors: Vec<Vec<f32>>,
    ) -> Result<(Vec<VectorPoint>, usize), VectorStoreError> {
        let expected = usize::try_from(self.config.vector_size).unwrap_or(usize::MAX);
        let mut vectors = vectors.into_iter();
        let mut points = Vec::with_capacity(batch.len());
        let mut dropped = 0;

        for doc in batch {
            let vector = vectors.next().unwrap_or_default();
            if vector.len() != expected {
                dropped += 1;
                continue;
            }
            let payload = doc
                .payload()
                .map_err(|e| VectorStoreError::Serialization(e.to_string()))?;
            points.push(VectorPoint {
                id: Uuid::new_v4().to_string(),
                vector,
                payload,
            });
        }
        Ok((points, dropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryVectorStore;
    use crate::document::DocumentMetadata;
    use std::sync::Mutex;

    fn make_docs(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| Document {
                text: format!("doc {i}"),
                metadata: DocumentMetadata::Readme {
                    repo: format!("r{i}"),
                },
            })
            .collect()
    }

    fn config(batch_size: usize) -> IngestConfig {
        IngestConfig {
            vector_size: 4,
            batch_size,
            batch_delay: Duration::ZERO,
            ..IngestConfig::default()
        }
    }

    fn fixed_embed(dim: usize) -> EmbedBatchFn {
        Box::new(move |texts: Vec<String>| -> EmbedBatchFuture {
            Box::pin(async move { Ok(texts.iter().map(|_| vec![0.5f32; dim]).collect()) })
        })
    }

    fn recording_embed(calls: Arc<Mutex<Vec<Vec<String>>>>) -> EmbedBatchFn {
        Box::new(move |texts: Vec<String>| -> EmbedBatchFuture {
            calls.lock().unwrap().push(texts.clone());
            Box::pin(async move { Ok(texts.iter().map(|_| vec![0.5f32; 4]).collect()) })
        })
    }

    fn error_embed() -> EmbedBatchFn {
        Box::new(|_texts: Vec<String>| -> EmbedBatchFuture {
            Box::pin(async move { Err(folio_llm::LlmError::Other("mock embed error".into())) })
        })
    }

    fn pipeline(
        store: &Arc<InMemoryVectorStore>,
        cfg: IngestConfig,
        embed: EmbedBatchFn,
    ) -> IngestionPipeline {
        IngestionPipeline::new(store.clone(), "kb", cfg, embed)
    }

    #[tokio::test]
    async fn one_record_per_document() {
        let store = Arc::new(InMemoryVectorStore::new());
        let report = pipeline(&store, config(5), fixed_embed(4))
            .ingest(make_docs(7))
            .await
            .unwrap();

        assert_eq!(report.documents, 7);
        assert_eq!(report.batches, 2);
        assert_eq!(report.upserted, 7);
        assert_eq!(report.dropped, 0);
        assert_eq!(store.count("kb").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn wrong_dimensions_are_dropped() {
        let store = Arc::new(InMemoryVectorStore::new());
        let report = pipeline(&store, config(5), fixed_embed(3))
            .ingest(make_docs(3))
            .await
            .unwrap();

        assert_eq!(report.upserted, 0);
        assert_eq!(report.dropped, 3);
        assert_eq!(store.count("kb").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_vectors_count_as_dropped() {
        let store = Arc::new(InMemoryVectorStore::new());
        let short: EmbedBatchFn = Box::new(|texts: Vec<String>| -> EmbedBatchFuture {
            Box::pin(async move { Ok(texts.iter().skip(1).map(|_| vec![1.0f32; 4]).collect()) })
        });
        let report = pipeline(&store, config(5), short)
            .ingest(make_docs(3))
            .await
            .unwrap();
        assert_eq!(report.upserted, 2);
        assert_eq!(report.dropped, 1);
    }

    #[tokio::test]
    async fn ingest_clears_previous_contents() {
        let store = Arc::new(InMemoryVectorStore::new());
        let p = pipeline(&store, config(2), fixed_embed(4));
        p.ingest(make_docs(5)).await.unwrap();
        p.ingest(make_docs(2)).await.unwrap();
        assert_eq!(store.count("kb").await.unwrap(), 2);

        p.ingest(Vec::new()).await.unwrap();
        assert_eq!(store.count("kb").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn every_document_embedded_exactly_once() {
        let store = Arc::new(InMemoryVectorStore::new());
        let calls = Arc::new(Mutex::new(Vec::new()));
        pipeline(&store, config(3), recording_embed(calls.clone()))
            .ingest(make_docs(8))
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        let sizes: Vec<usize> = calls.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 2]);
        let flat: Vec<&String> = calls.iter().flatten().collect();
        let expected: Vec<String> = (0..8).map(|i| format!("doc {i}")).collect();
        assert_eq!(flat, expected.iter().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn embedding_error_propagates_with_committed_count() {
        let store = Arc::new(InMemoryVectorStore::new());
        let err = pipeline(&store, config(5), error_embed())
            .ingest(make_docs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Embedding { committed: 0, .. }));
    }

    #[tokio::test]
    async fn failure_mid_run_keeps_earlier_batches() {
        let store = Arc::new(InMemoryVectorStore::new());
        let calls = Arc::new(Mutex::new(0usize));
        let flaky: EmbedBatchFn = Box::new(move |texts: Vec<String>| -> EmbedBatchFuture {
            let mut n = calls.lock().unwrap();
            *n += 1;
            let fail = *n > 1;
            Box::pin(async move {
                if fail {
                    Err(folio_llm::LlmError::Unavailable)
                } else {
                    Ok(texts.iter().map(|_| vec![1.0f32; 4]).collect())
                }
            })
        });
        let err = pipeline(&store, config(2), flaky)
            .ingest(make_docs(5))
            .await
            .unwrap_err();
        assert_eq!(err.committed(), 2);
        assert_eq!(store.count("kb").await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_applies_between_batches_only() {
        let store = Arc::new(InMemoryVectorStore::new());
        let cfg = IngestConfig {
            batch_delay: Duration::from_secs(1),
            ..config(2)
        };
        let start = tokio::time::Instant::now();
        pipeline(&store, cfg, fixed_embed(4))
            .ingest(make_docs(6))
            .await
            .unwrap();
        assert_eq!(start.elapsed().as_secs(), 2);
    }

    #[tokio::test]
    async fn payload_contains_text_and_metadata() {
        let store = Arc::new(InMemoryVectorStore::new());
        pipeline(&store, config(5), fixed_embed(4))
            .ingest(make_docs(1))
            .await
            .unwrap();
        let hits = store.search("kb", vec![0.5; 4], 1).await.unwrap();
        assert_eq!(hits[0].text(), Some("doc 0"));
        assert_eq!(hits[0].payload["type"], "readme");
        assert_eq!(hits[0].payload["source"], "README.md");
        assert!(Uuid::parse_str(&hits[0].id).is_ok());
    }
}
