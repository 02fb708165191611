use std::sync::Arc;
use std::time::Duration;

use folio_llm::LlmProvider;
use folio_llm::provider::EmbedBatchFuture;
use folio_llm::mock::MockProvider;
use folio_memory::document::{
    EmbedBatchFn, IngestConfig, IngestionPipeline, Normalizer, RepoSnapshot,
};
use folio_memory::{DistanceMetric, QdrantOps, VectorStore};
use testcontainers::ContainerAsync;
use testcontainers::GenericImage;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;

const QDRANT_GRPC_PORT: ContainerPort = ContainerPort::Tcp(6334);

fn qdrant_image() -> GenericImage {
    GenericImage::new("qdrant/qdrant", "v1.16.0")
        .with_wait_for(WaitFor::message_on_stdout("gRPC listening"))
        .with_exposed_port(QDRANT_GRPC_PORT)
}

async fn setup() -> (QdrantOps, ContainerAsync<GenericImage>) {
    let container = qdrant_image().start().await.unwrap();
    let grpc_port = container.get_host_port_ipv4(6334).await.unwrap();
    let ops = QdrantOps::new(&format!("http://127.0.0.1:{grpc_port}"))
        .unwrap()
        .with_provision_timeout(Duration::from_secs(30));
    (ops, container)
}

fn embedder(mock: &MockProvider) -> EmbedBatchFn {
    let mock = Arc::new(mock.clone());
    Box::new(move |texts: Vec<String>| -> EmbedBatchFuture {
        let mock = Arc::clone(&mock);
        Box::pin(async move { mock.embed_batch(&texts).await })
    })
}

#[tokio::test]
#[ignore = "requires docker"]
async fn ensure_collection_is_idempotent() {
    let (ops, _container) = setup().await;
    ops.ensure_collection("kb", 768, DistanceMetric::Cosine)
        .await
        .unwrap();
    ops.ensure_collection("kb", 768, DistanceMetric::Cosine)
        .await
        .unwrap();
    assert!(VectorStore::collection_exists(&ops, "kb").await.unwrap());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn ingest_search_and_reset_round_trip() {
    let (ops, _container) = setup().await;
    let store: Arc<dyn VectorStore> = Arc::new(ops);
    let mock = MockProvider::default().with_keywords(&["express", "postgres"], 8);

    let repo = RepoSnapshot {
        name: "api".into(),
        manifest: Some(r#"{"dependencies":{"express":"4","pg":"8"}}"#.into()),
        readme: Some("Postgres-backed service".into()),
        ..RepoSnapshot::default()
    };
    let docs = Normalizer::default().normalize(Some("backend engineer"), &[repo]);

    let config = IngestConfig {
        vector_size: 8,
        batch_delay: Duration::ZERO,
        ..IngestConfig::default()
    };
    let pipeline = IngestionPipeline::new(store.clone(), "kb", config, embedder(&mock));
    let report = pipeline.ingest(docs).await.unwrap();
    assert_eq!(report.upserted, 3);
    assert_eq!(store.count("kb").await.unwrap(), 3);

    let query = mock.embed("express").await.unwrap();
    let hits = store.search("kb", query.clone(), 15).await.unwrap();
    assert_eq!(hits[0].payload["type"], "skills");
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    store.delete_all("kb").await.unwrap();
    assert_eq!(store.count("kb").await.unwrap(), 0);
    assert!(store.search("kb", query, 15).await.unwrap().is_empty());
}
