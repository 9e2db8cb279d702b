//! Exhaustive cosine scan over a frozen graph's embedded nodes.

use crate::store::KnowledgeGraph;
use tessera_core::embedding::cosine_similarity;
use tracing::warn;

/// Top-k nodes by cosine similarity to `query`. Nodes without an embedding,
/// or whose embedding width differs from the query's, are skipped rather than
/// scored as zero. Ordering is deterministic: score descending, then node id
/// ascending.
pub fn search(graph: &KnowledgeGraph, query: &[f32], k: usize) -> Vec<(String, f32)> {
    if k == 0 || query.is_empty() {
        return Vec::new();
    }

    let mut scores: Vec<(String, f32)> = Vec::new();
    for node in graph.nodes() {
        let Some(embedding) = &node.embedding else {
            continue;
        };
        match cosine_similarity(query, embedding) {
            Some(score) => scores.push((node.id.clone(), score)),
            None => {
                warn!(node_id = %node.id, "embedding width mismatch, skipping in vector scan");
            }
        }
    }

    scores.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scores.truncate(k);
    scores
}
