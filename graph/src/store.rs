//! Graph arena: a single-writer build-phase store that freezes into an
//! immutable, lock-free snapshot for concurrent querying.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tessera_core::model::{Edge, Node, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphError {
    DuplicateNode(String),
    DanglingEdge {
        source: String,
        target: String,
        relation: String,
    },
}

// Manual impls instead of `thiserror::Error`: the derive treats any field
// named `source` as the error's source and requires it to be an `Error`,
// which the `String` endpoint id here is not.
impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DuplicateNode(id) => write!(f, "duplicate node id: {id}"),
            GraphError::DanglingEdge {
                source,
                target,
                relation,
            } => write!(f, "dangling edge {source} -> {target} ({relation})"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Build-phase graph. Nodes and edges land in arenas indexed by insertion
/// position; string ids resolve through a side map. Consumed by `freeze`.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    id_index: HashMap<String, u32>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duplicate ids are rejected; the first-added node wins.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.id_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let index = self.nodes.len() as u32;
        self.id_index.insert(node.id.clone(), index);
        self.nodes.push(node);
        Ok(())
    }

    /// Both endpoints must already exist as nodes.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if !self.id_index.contains_key(&edge.source) || !self.id_index.contains_key(&edge.target) {
            return Err(GraphError::DanglingEdge {
                source: edge.source,
                target: edge.target,
                relation: edge.relation,
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in arena (insertion) order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Attach an embedding to an existing node. Returns false when the id is
    /// unknown.
    pub fn attach_embedding(&mut self, id: &str, embedding: Vec<f32>) -> bool {
        match self.id_index.get(id) {
            Some(&index) => {
                self.nodes[index as usize].embedding = Some(embedding);
                true
            }
            None => false,
        }
    }

    /// Publish the graph. Adjacency is materialized once here; the returned
    /// snapshot has no mutation path, so readers share it without locks.
    pub fn freeze(self) -> KnowledgeGraph {
        let mut outgoing: Vec<Vec<u32>> = vec![Vec::new(); self.nodes.len()];
        let mut incoming: Vec<Vec<u32>> = vec![Vec::new(); self.nodes.len()];

        for (edge_index, edge) in self.edges.iter().enumerate() {
            let source = self.id_index[&edge.source] as usize;
            let target = self.id_index[&edge.target] as usize;
            outgoing[source].push(edge_index as u32);
            incoming[target].push(edge_index as u32);
        }

        KnowledgeGraph {
            nodes: self.nodes,
            edges: self.edges,
            id_index: self.id_index,
            outgoing,
            incoming,
        }
    }
}

/// Immutable document graph snapshot. `Send + Sync`; share via `Arc` across
/// concurrent retrieval and assembly calls.
#[derive(Debug)]
pub struct KnowledgeGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    id_index: HashMap<String, u32>,
    outgoing: Vec<Vec<u32>>,
    incoming: Vec<Vec<u32>>,
}

impl KnowledgeGraph {
    pub fn empty() -> Self {
        GraphStore::new().freeze()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.id_index.get(id).map(|&i| &self.nodes[i as usize])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// One-hop neighbors in either direction, deduplicated.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let Some(&index) = self.id_index.get(id) else {
            return Vec::new();
        };
        let index = index as usize;

        let mut seen: Vec<&str> = Vec::new();
        let hops = self.outgoing[index]
            .iter()
            .map(|&e| self.edges[e as usize].target.as_str())
            .chain(
                self.incoming[index]
                    .iter()
                    .map(|&e| self.edges[e as usize].source.as_str()),
            );
        for neighbor in hops {
            if neighbor != id && !seen.contains(&neighbor) {
                seen.push(neighbor);
            }
        }
        seen
    }

    /// Incident edge count, both directions. Self-loops count twice, matching
    /// the degree definition used for importance scoring.
    pub fn degree(&self, id: &str) -> usize {
        match self.id_index.get(id) {
            Some(&index) => {
                self.outgoing[index as usize].len() + self.incoming[index as usize].len()
            }
            None => 0,
        }
    }

    /// Edges incident to a node, both directions.
    pub fn incident_edges(&self, id: &str) -> Vec<&Edge> {
        let Some(&index) = self.id_index.get(id) else {
            return Vec::new();
        };
        let index = index as usize;
        self.outgoing[index]
            .iter()
            .chain(self.incoming[index].iter())
            .map(|&e| &self.edges[e as usize])
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            edges: self.edges.len(),
            ..Default::default()
        };
        for node in &self.nodes {
            match node.kind() {
                NodeKind::Chunk => stats.chunks += 1,
                NodeKind::Entity => stats.entities += 1,
                NodeKind::Table => stats.tables += 1,
                NodeKind::Figure => stats.figures += 1,
            }
            if node.embedding.is_some() {
                stats.embedded += 1;
            }
        }
        stats
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub chunks: usize,
    pub entities: usize,
    pub tables: usize,
    pub figures: usize,
    pub edges: usize,
    pub embedded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::model::NodeContent;

    fn chunk(id: &str, text: &str) -> Node {
        Node::new(
            id,
            NodeContent::Chunk {
                text: text.to_string(),
            },
        )
    }

    #[test]
    fn duplicate_node_is_rejected_first_wins() {
        let mut store = GraphStore::new();
        store.add_node(chunk("c1", "first")).unwrap();
        let err = store.add_node(chunk("c1", "second")).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode("c1".to_string()));

        let graph = store.freeze();
        match &graph.get("c1").unwrap().content {
            NodeContent::Chunk { text } => assert_eq!(text, "first"),
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let mut store = GraphStore::new();
        store.add_node(chunk("c1", "a")).unwrap();
        let err = store
            .add_edge(Edge::new("c1", "missing", "mentions", 0.8))
            .unwrap_err();
        assert!(matches!(err, GraphError::DanglingEdge { .. }));
    }

    #[test]
    fn frozen_graph_has_no_dangling_edges() {
        let mut store = GraphStore::new();
        store.add_node(chunk("c1", "a")).unwrap();
        store.add_node(chunk("c2", "b")).unwrap();
        store.add_edge(Edge::new("c1", "c2", "next", 1.0)).unwrap();

        let graph = store.freeze();
        for edge in graph.edges() {
            assert!(graph.contains(&edge.source));
            assert!(graph.contains(&edge.target));
        }
    }

    #[test]
    fn neighbors_cover_both_directions() {
        let mut store = GraphStore::new();
        store.add_node(chunk("a", "")).unwrap();
        store.add_node(chunk("b", "")).unwrap();
        store.add_node(chunk("c", "")).unwrap();
        store.add_edge(Edge::new("a", "b", "next", 1.0)).unwrap();
        store.add_edge(Edge::new("c", "a", "next", 1.0)).unwrap();

        let graph = store.freeze();
        let mut neighbors = graph.neighbors("a");
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec!["b", "c"]);
        assert_eq!(graph.degree("a"), 2);
    }

    #[test]
    fn parallel_edges_with_distinct_relations_are_kept() {
        let mut store = GraphStore::new();
        store.add_node(chunk("a", "")).unwrap();
        store.add_node(chunk("b", "")).unwrap();
        store.add_edge(Edge::new("a", "b", "mentions", 0.9)).unwrap();
        store.add_edge(Edge::new("a", "b", "refers_to", 0.5)).unwrap();

        let graph = store.freeze();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.neighbors("a"), vec!["b"]);
        assert_eq!(graph.degree("b"), 2);
    }

    #[test]
    fn stats_count_per_kind() {
        let mut store = GraphStore::new();
        store.add_node(chunk("c1", "a")).unwrap();
        store
            .add_node(Node::new(
                "e1",
                NodeContent::Entity {
                    text: "Acme".to_string(),
                    entity_type: "ORG".to_string(),
                },
            ))
            .unwrap();
        store.attach_embedding("c1", vec![1.0, 0.0]);

        let stats = store.freeze().stats();
        assert_eq!(stats.chunks, 1);
        assert_eq!(stats.entities, 1);
        assert_eq!(stats.embedded, 1);
    }
}
