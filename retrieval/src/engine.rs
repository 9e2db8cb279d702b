//! Per-query facade: retrieve then assemble against one immutable graph
//! snapshot. Engines are `Send + Sync`; clone the `Arc` and query from as
//! many tasks as needed.

use crate::assembler::{Context, ContextAssembler};
use crate::retriever::{HybridRetriever, ScoredCandidate};
use graph::KnowledgeGraph;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tessera_core::config::AppConfig;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextResponse {
    pub candidates: Vec<ScoredCandidate>,
    pub context: Context,
    pub latency_ms: u64,
}

pub struct ContextEngine {
    graph: Arc<KnowledgeGraph>,
    retriever: HybridRetriever,
    assembler: ContextAssembler,
}

impl ContextEngine {
    pub fn new(graph: Arc<KnowledgeGraph>, config: &AppConfig) -> Self {
        Self {
            graph,
            retriever: HybridRetriever::new(config.retrieval.clone()),
            assembler: ContextAssembler::new(config.assembly.clone()),
        }
    }

    pub fn with_components(
        graph: Arc<KnowledgeGraph>,
        retriever: HybridRetriever,
        assembler: ContextAssembler,
    ) -> Self {
        Self {
            graph,
            retriever,
            assembler,
        }
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    /// One retrieval round trip: hybrid candidate ranking followed by
    /// budgeted assembly. Reads only; any number of calls may run
    /// concurrently against the same snapshot.
    pub fn query(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        max_tokens: usize,
    ) -> ContextResponse {
        let start = Instant::now();

        let candidates = self.retriever.retrieve(&self.graph, query_embedding, top_k);
        let candidate_ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let context = self
            .assembler
            .assemble(&candidate_ids, &self.graph, query_embedding, max_tokens);

        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(
            candidates = candidates.len(),
            total_tokens = context.total_tokens,
            latency_ms,
            "query served"
        );

        ContextResponse {
            candidates,
            context,
            latency_ms,
        }
    }

    /// Query with the assembler's configured token budget.
    pub fn query_default_budget(&self, query_embedding: &[f32], top_k: usize) -> ContextResponse {
        self.query(query_embedding, top_k, self.assembler.max_tokens())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::GraphStore;
    use tessera_core::model::{Node, NodeContent};

    #[test]
    fn empty_graph_query_returns_empty_response() {
        let engine = ContextEngine::new(
            Arc::new(GraphStore::new().freeze()),
            &AppConfig::default(),
        );
        let response = engine.query(&[1.0, 0.0], 5, 100);
        assert!(response.candidates.is_empty());
        assert_eq!(response.context.total_tokens, 0);
    }

    #[test]
    fn query_packs_retrieved_chunks() {
        let mut store = GraphStore::new();
        let mut node = Node::new(
            "c1",
            NodeContent::Chunk {
                text: "alpha beta".to_string(),
            },
        );
        node.embedding = Some(vec![1.0, 0.0]);
        store.add_node(node).unwrap();
        let engine = ContextEngine::new(Arc::new(store.freeze()), &AppConfig::default());

        let response = engine.query(&[1.0, 0.0], 1, 100);
        assert_eq!(response.candidates.len(), 1);
        assert_eq!(response.context.text, vec!["alpha beta".to_string()]);
        assert_eq!(response.context.total_tokens, 2);
    }
}
