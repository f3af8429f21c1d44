//! End-to-end retrieval flow over the in-memory store and the local
//! deterministic embedder.

use std::sync::Arc;

use sift_core::{ChatMessage, Chunk, ChunkMetadata, Embedder, SiftConfig, Strategy};
use sift_embed::HashingEmbedder;
use sift_pipeline::RetrievalPipeline;
use sift_store::MemoryStore;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn chunk(content: &str, category: &str, kind: Option<&str>) -> Chunk {
    Chunk::new(
        content,
        ChunkMetadata {
            category: Some(category.to_string()),
            source: Some("el kitabı".to_string()),
            kind: kind.map(String::from),
        },
    )
}

async fn seeded_pipeline() -> RetrievalPipeline<MemoryStore, HashingEmbedder> {
    let store = Arc::new(MemoryStore::new());
    let embedder = HashingEmbedder::new();

    let mut chunks = vec![
        chunk(
            "Yıllık izin hakkı 14 gündür. İzin talebi yazılı olarak yapılır \
             ve yönetici onayından sonra sisteme işlenir.",
            "leave_vacation",
            Some("policy"),
        ),
        chunk(
            "Maaş ödemeleri her ayın 5'inde banka hesabına yatırılır. \
             Bordro detayları intranet üzerinden görüntülenebilir.",
            "salary_benefits",
            Some("policy"),
        ),
        chunk(
            "Eğitim talepleri departman yöneticisi tarafından onaylanır ve \
             yıllık eğitim bütçesinden karşılanır.",
            "training",
            Some("procedure"),
        ),
        chunk(
            "Seyahat harcırahı, konaklama ve yol giderlerini kapsar; \
             muhasebeye fatura ile bildirilir.",
            "travel",
            Some("procedure"),
        ),
    ];
    for c in &mut chunks {
        c.embedding = embedder.embed(&c.content).await.unwrap();
    }
    store.insert(chunks).unwrap();

    RetrievalPipeline::new(store, Arc::new(HashingEmbedder::new()), SiftConfig::default())
}

#[tokio::test]
async fn retrieves_topical_context_with_metadata_labels() {
    init_tracing();
    let pipeline = seeded_pipeline().await;

    let retrieved = pipeline
        .retrieve_context("yıllık izin kaç gün?", &[])
        .await
        .unwrap();

    assert!(!retrieved.fallback);
    assert_eq!(retrieved.strategy, Strategy::Normal);
    assert!(retrieved.selected_chunks[0]
        .chunk
        .content
        .contains("izin"));
    assert!(retrieved.context_string.contains("[CATEGORY: leave_vacation]"));
    assert!(retrieved.context_string.contains("[SOURCE: el kitabı]"));
}

#[tokio::test]
async fn conversation_history_steers_retrieval() {
    init_tracing();
    let pipeline = seeded_pipeline().await;

    let history = vec![
        ChatMessage::user("bordro kesintileri nereden görünür?"),
        ChatMessage::assistant("Bordro intranet üzerinden görüntülenir."),
    ];

    let retrieved = pipeline
        .retrieve_context("ödeme tarihi ne zaman?", &history)
        .await
        .unwrap();

    assert!(!retrieved.fallback);
    assert!(retrieved
        .selected_chunks
        .iter()
        .any(|c| c.chunk.metadata.category.as_deref() == Some("salary_benefits")));
}

#[tokio::test]
async fn selection_respects_final_top_k() {
    init_tracing();
    let pipeline = seeded_pipeline().await;

    let retrieved = pipeline
        .retrieve_context("izin maaş eğitim seyahat kuralları", &[])
        .await
        .unwrap();

    assert!(retrieved.selected_chunks.len() <= SiftConfig::default().rerank.final_top_k);
}
