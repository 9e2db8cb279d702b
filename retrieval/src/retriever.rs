//! Hybrid retrieval: vector similarity seeds, one-hop graph expansion, then
//! a blended similarity/importance ranking.

use graph::{vector, KnowledgeGraph};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tessera_core::config::RetrievalConfig;
use tessera_core::embedding::cosine_similarity;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: String,
    pub score: f32,
}

pub struct HybridRetriever {
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    /// Ranked candidates for a query embedding, at most `top_k` of them,
    /// ordered score-descending with ascending-id tie-break. Empty results
    /// (empty graph, `top_k` of zero, no dimension-compatible embeddings) are
    /// a valid outcome, never an error.
    pub fn retrieve(
        &self,
        graph: &KnowledgeGraph,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Vec<ScoredCandidate> {
        if top_k == 0 || graph.node_count() == 0 {
            return Vec::new();
        }

        // Stage 1: similarity seeds, wider than top_k so expansion has
        // material to work with.
        let seed_width = self.config.width_factor.max(1).saturating_mul(top_k);
        let seeds = vector::search(graph, query_embedding, seed_width);

        // Stage 2: union seeds with their one-hop neighborhood, either
        // direction. Surfaces structurally related nodes that do not rank on
        // raw similarity.
        let mut candidates: Vec<String> = Vec::new();
        for (id, _) in &seeds {
            if !candidates.contains(id) {
                candidates.push(id.clone());
            }
            for neighbor in graph.neighbors(id) {
                if !candidates.iter().any(|c| c == neighbor) {
                    candidates.push(neighbor.to_string());
                }
            }
        }
        debug!(
            seeds = seeds.len(),
            candidates = candidates.len(),
            "expanded candidate pool"
        );

        // Stage 3: blend similarity with normalized degree. Candidates
        // without a compatible embedding cannot take a similarity term and
        // drop out of the ranking.
        let alpha = self.config.alpha.clamp(0.0, 1.0);
        let node_count = graph.node_count() as f32;
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter_map(|id| {
                let node = graph.get(&id)?;
                let embedding = node.embedding.as_deref()?;
                let similarity = cosine_similarity(query_embedding, embedding)?;
                let importance = graph.degree(&id) as f32 / node_count;
                Some(ScoredCandidate {
                    id,
                    score: alpha * similarity + (1.0 - alpha) * importance,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(top_k);
        scored
    }
}

impl Default for HybridRetriever {
    fn default() -> Self {
        Self::new(RetrievalConfig::default())
    }
}
