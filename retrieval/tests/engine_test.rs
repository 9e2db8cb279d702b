use builder::encoder::DEFAULT_TEXT_MODEL_ID;
use builder::{DeterministicImageEncoder, DeterministicTextEncoder, GraphBuilder};
use retrieval::ContextEngine;
use std::sync::Arc;
use tessera_core::config::AppConfig;
use tessera_core::element::{
    ChunkRecord, DocumentElements, EntityRecord, FigureRecord, RelationshipRecord, TableRecord,
};
use tessera_core::embedding::deterministic_embedding;

const DIMS: usize = 16;

fn sample_document() -> DocumentElements {
    DocumentElements {
        chunks: vec![
            ChunkRecord::new("c1", "Battery capacity grew twelve percent year over year."),
            ChunkRecord::new("c2", "Charging infrastructure lags behind vehicle sales."),
            ChunkRecord::new("c3", "An appendix lists unrelated regulatory filings."),
        ],
        entities: vec![
            EntityRecord::new("e1", "battery capacity", "METRIC").with_chunk("c1"),
            EntityRecord::new("e2", "charging infrastructure", "INFRA").with_chunk("c2"),
        ],
        tables: vec![TableRecord {
            id: "t1".to_string(),
            headers: vec!["year".to_string(), "capacity_gwh".to_string()],
            rows: vec![
                vec!["2024".to_string(), "91".to_string()],
                vec!["2025".to_string(), "102".to_string()],
            ],
            caption: "Annual battery capacity".to_string(),
            metadata: Default::default(),
        }],
        figures: vec![FigureRecord {
            id: "f1".to_string(),
            caption: "Capacity growth curve".to_string(),
            image_ref: "figures/capacity.png".to_string(),
            metadata: Default::default(),
        }],
        relationships: vec![
            RelationshipRecord::new("e1", "e2", "depends_on").with_confidence(0.6),
        ],
    }
}

async fn built_engine() -> ContextEngine {
    let builder = GraphBuilder::with_encoders(
        Arc::new(DeterministicTextEncoder::new(DIMS)),
        Arc::new(DeterministicImageEncoder::new(DIMS)),
        DIMS,
    );
    let (graph, report) = builder.build(sample_document()).await;
    assert!(report.is_clean(), "issues: {:?}", report.issues);
    ContextEngine::new(Arc::new(graph), &AppConfig::default())
}

#[tokio::test]
async fn end_to_end_query_returns_multimodal_context() {
    let engine = built_engine().await;

    // Query with the exact embedding of c1's text: c1 must rank first.
    let query = deterministic_embedding(
        "Battery capacity grew twelve percent year over year.",
        DEFAULT_TEXT_MODEL_ID,
        DIMS,
    );
    let response = engine.query(&query, 6, 400);

    assert_eq!(response.candidates[0].id, "chunk_c1");
    assert!(response
        .context
        .text
        .iter()
        .any(|t| t.contains("Battery capacity grew")));
    assert!(response.context.total_tokens <= 400);
    for pair in response.candidates.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn contains_edges_pull_entities_into_candidates() {
    let engine = built_engine().await;

    let query = deterministic_embedding(
        "Battery capacity grew twelve percent year over year.",
        DEFAULT_TEXT_MODEL_ID,
        DIMS,
    );
    let response = engine.query(&query, 8, 400);

    // e1 is contained in c1; expansion must make it reachable even if its
    // raw similarity to the query is modest.
    assert!(
        response.candidates.iter().any(|c| c.id == "entity_e1"),
        "candidates: {:?}",
        response.candidates
    );
}

#[tokio::test]
async fn repeated_queries_are_identical() {
    let engine = built_engine().await;
    let query = deterministic_embedding("charging", DEFAULT_TEXT_MODEL_ID, DIMS);

    let a = engine.query(&query, 5, 300);
    let b = engine.query(&query, 5, 300);
    assert_eq!(a.candidates, b.candidates);
    assert_eq!(a.context, b.context);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_queries_share_one_snapshot() {
    let engine = Arc::new(built_engine().await);
    let query = Arc::new(deterministic_embedding(
        "battery capacity",
        DEFAULT_TEXT_MODEL_ID,
        DIMS,
    ));

    let baseline = engine.query(&query, 5, 300);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        let query = Arc::clone(&query);
        handles.push(tokio::spawn(async move { engine.query(&query, 5, 300) }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.candidates, baseline.candidates);
        assert_eq!(response.context, baseline.context);
    }
}

#[tokio::test]
async fn mismatched_query_dimension_degrades_to_empty_context() {
    let engine = built_engine().await;
    let query = deterministic_embedding("battery", DEFAULT_TEXT_MODEL_ID, DIMS + 1);

    let response = engine.query(&query, 5, 300);
    assert!(response.candidates.is_empty());
    assert_eq!(response.context.total_tokens, 0);
}
