//! Batch graph construction: one pass over a document's extracted elements
//! produces one frozen graph plus a non-fatal issue report.

use crate::encoder::{
    DeterministicImageEncoder, DeterministicTextEncoder, EncoderError, ImageEncoder, TextEncoder,
};
use crate::report::{BuildIssue, BuildReport};
use dashmap::DashMap;
use graph::{GraphError, GraphStore, KnowledgeGraph};
use std::collections::HashSet;
use std::sync::Arc;
use tessera_core::element::DocumentElements;
use tessera_core::model::{
    chunk_node_id, entity_node_id, figure_node_id, table_node_id, Edge, Node, NodeContent,
    CONTAINS_RELATION,
};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// What gets sent to which encoder for one node.
#[derive(Debug, Clone)]
enum EncodeInput {
    Text(String),
    Image(String),
}

pub struct GraphBuilder {
    text_encoder: Arc<dyn TextEncoder>,
    image_encoder: Arc<dyn ImageEncoder>,
    /// Embeddings of any other width are rejected per node, never fatally.
    expected_dimension: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            text_encoder: Arc::new(DeterministicTextEncoder::default()),
            image_encoder: Arc::new(DeterministicImageEncoder::default()),
            expected_dimension: 768,
        }
    }

    pub fn with_encoders(
        text_encoder: Arc<dyn TextEncoder>,
        image_encoder: Arc<dyn ImageEncoder>,
        expected_dimension: usize,
    ) -> Self {
        Self {
            text_encoder,
            image_encoder,
            expected_dimension: expected_dimension.max(1),
        }
    }

    /// Build a document graph. Structural violations and per-node embedding
    /// failures are reported, not raised; the batch always completes and the
    /// returned snapshot is fully published before any querying starts.
    pub async fn build(&self, elements: DocumentElements) -> (KnowledgeGraph, BuildReport) {
        let mut store = GraphStore::new();
        let mut report = BuildReport::default();

        self.add_nodes(&mut store, &mut report, &elements);
        self.add_contains_edges(&mut store, &mut report, &elements);
        self.add_relationship_edges(&mut store, &mut report, &elements);
        self.attach_embeddings(&mut store, &mut report).await;

        (store.freeze(), report)
    }

    fn add_nodes(
        &self,
        store: &mut GraphStore,
        report: &mut BuildReport,
        elements: &DocumentElements,
    ) {
        for chunk in &elements.chunks {
            let mut node = Node::new(
                chunk_node_id(&chunk.id),
                NodeContent::Chunk {
                    text: chunk.text.clone(),
                },
            );
            node.metadata = chunk.metadata.clone();
            if let Some(prev) = &chunk.prev_id {
                node.metadata
                    .insert("prev_chunk".to_string(), chunk_node_id(prev));
            }
            if let Some(next) = &chunk.next_id {
                node.metadata
                    .insert("next_chunk".to_string(), chunk_node_id(next));
            }
            add_node_reported(store, report, node);
        }

        for table in &elements.tables {
            let mut node = Node::new(
                table_node_id(&table.id),
                NodeContent::Table {
                    headers: table.headers.clone(),
                    rows: table.rows.clone(),
                    caption: table.caption.clone(),
                },
            );
            node.metadata = table.metadata.clone();
            add_node_reported(store, report, node);
        }

        for figure in &elements.figures {
            let mut node = Node::new(
                figure_node_id(&figure.id),
                NodeContent::Figure {
                    caption: figure.caption.clone(),
                    image_ref: figure.image_ref.clone(),
                },
            );
            node.metadata = figure.metadata.clone();
            add_node_reported(store, report, node);
        }

        for entity in &elements.entities {
            let mut node = Node::new(
                entity_node_id(&entity.id),
                NodeContent::Entity {
                    text: entity.text.clone(),
                    entity_type: entity.entity_type.clone(),
                },
            );
            node.metadata = entity.metadata.clone();
            add_node_reported(store, report, node);
        }
    }

    /// Entity provenance: chunk -> entity at full confidence. Only the first
    /// record per entity id contributes an edge; later records were rejected
    /// as duplicate nodes and must not inflate the survivor's degree.
    fn add_contains_edges(
        &self,
        store: &mut GraphStore,
        report: &mut BuildReport,
        elements: &DocumentElements,
    ) {
        let mut seen: HashSet<&str> = HashSet::new();
        for entity in &elements.entities {
            if !seen.insert(entity.id.as_str()) {
                debug!(entity_id = %entity.id, "duplicate entity record, skipping provenance edge");
                continue;
            }
            let Some(chunk_id) = &entity.chunk_id else {
                continue;
            };
            let edge = Edge::new(
                chunk_node_id(chunk_id),
                entity_node_id(&entity.id),
                CONTAINS_RELATION,
                1.0,
            );
            add_edge_reported(store, report, edge);
        }
    }

    fn add_relationship_edges(
        &self,
        store: &mut GraphStore,
        report: &mut BuildReport,
        elements: &DocumentElements,
    ) {
        for rel in &elements.relationships {
            let source = resolve_endpoint(store, &rel.source_id);
            let target = resolve_endpoint(store, &rel.target_id);
            let (Some(source), Some(target)) = (source, target) else {
                warn!(
                    source = %rel.source_id,
                    target = %rel.target_id,
                    relation = %rel.relation,
                    "dropping relationship with unresolvable endpoint"
                );
                report.record(BuildIssue::DanglingEdge {
                    source: rel.source_id.clone(),
                    target: rel.target_id.clone(),
                    relation: rel.relation.clone(),
                });
                continue;
            };

            let edge = Edge::new(
                source,
                target,
                rel.relation.as_str(),
                rel.confidence.unwrap_or(1.0),
            );
            add_edge_reported(store, report, edge);
        }
    }

    /// Request an embedding for every node with encodable content. Encoder
    /// calls run concurrently; each node's outcome is isolated, so one failed
    /// call never aborts its siblings.
    async fn attach_embeddings(&self, store: &mut GraphStore, report: &mut BuildReport) {
        // Arena order is fixed at this point; requests inherit it so the
        // attach loop below is reproducible.
        let mut requests: Vec<(String, EncodeInput)> = Vec::new();
        for (id, input) in collect_encode_inputs(store) {
            match input {
                Some(input) => requests.push((id, input)),
                None => debug!(node_id = %id, "empty content, skipping embedding"),
            }
        }

        let results: Arc<DashMap<String, Result<Vec<f32>, EncoderError>>> =
            Arc::new(DashMap::new());
        let mut tasks = JoinSet::new();

        for (id, input) in &requests {
            let id = id.clone();
            let results = Arc::clone(&results);
            match input {
                EncodeInput::Text(text) => {
                    let encoder = Arc::clone(&self.text_encoder);
                    let text = text.clone();
                    tasks.spawn(async move {
                        let outcome = encoder.encode(&text).await;
                        results.insert(id, outcome);
                    });
                }
                EncodeInput::Image(image_ref) => {
                    let encoder = Arc::clone(&self.image_encoder);
                    let image_ref = image_ref.clone();
                    tasks.spawn(async move {
                        let outcome = encoder.encode(&image_ref).await;
                        results.insert(id, outcome);
                    });
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                // Panic inside one encoder task; the node simply stays
                // unembedded and the map has no entry for it.
                warn!(error = %err, "encoder task aborted");
            }
        }

        for (id, _) in &requests {
            let outcome = results.remove(id).map(|(_, v)| v);
            match outcome {
                Some(Ok(embedding)) if embedding.len() == self.expected_dimension => {
                    store.attach_embedding(id, embedding);
                }
                Some(Ok(embedding)) => {
                    let reason = format!(
                        "dimension mismatch: got {}, expected {}",
                        embedding.len(),
                        self.expected_dimension
                    );
                    warn!(node_id = %id, %reason, "keeping node without embedding");
                    report.record(BuildIssue::EmbeddingFailure {
                        id: id.clone(),
                        reason,
                    });
                }
                Some(Err(err)) => {
                    warn!(node_id = %id, error = %err, "keeping node without embedding");
                    report.record(BuildIssue::EmbeddingFailure {
                        id: id.clone(),
                        reason: err.to_string(),
                    });
                }
                None => {
                    report.record(BuildIssue::EmbeddingFailure {
                        id: id.clone(),
                        reason: "encoder task aborted".to_string(),
                    });
                }
            }
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn add_node_reported(store: &mut GraphStore, report: &mut BuildReport, node: Node) {
    if let Err(GraphError::DuplicateNode(id)) = store.add_node(node) {
        warn!(node_id = %id, "duplicate node id, keeping first");
        report.record(BuildIssue::DuplicateNode { id });
    }
}

fn add_edge_reported(store: &mut GraphStore, report: &mut BuildReport, edge: Edge) {
    if let Err(GraphError::DanglingEdge {
        source,
        target,
        relation,
    }) = store.add_edge(edge)
    {
        warn!(%source, %target, %relation, "dropping edge with missing endpoint");
        report.record(BuildIssue::DanglingEdge {
            source,
            target,
            relation,
        });
    }
}

/// Relationship endpoints may arrive fully qualified or as raw chunk/entity
/// ids. Resolution tries the id as-is, then the entity namespace, then the
/// chunk namespace; first existing node wins.
fn resolve_endpoint(store: &GraphStore, raw: &str) -> Option<String> {
    if store.contains(raw) {
        return Some(raw.to_string());
    }
    let as_entity = entity_node_id(raw);
    if store.contains(&as_entity) {
        return Some(as_entity);
    }
    let as_chunk = chunk_node_id(raw);
    if store.contains(&as_chunk) {
        return Some(as_chunk);
    }
    None
}

fn collect_encode_inputs(store: &GraphStore) -> Vec<(String, Option<EncodeInput>)> {
    store
        .nodes()
        .map(|node| {
            let input = match &node.content {
                NodeContent::Chunk { text } | NodeContent::Entity { text, .. } => {
                    non_empty(text).map(EncodeInput::Text)
                }
                NodeContent::Table { headers, rows, .. } => {
                    non_empty(&table_to_text(headers, rows)).map(EncodeInput::Text)
                }
                NodeContent::Figure { image_ref, .. } => {
                    non_empty(image_ref).map(EncodeInput::Image)
                }
            };
            (node.id.clone(), input)
        })
        .collect()
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Pipe-delimited serialization of a table for the text encoder: header line
/// first, then one line per row.
pub fn table_to_text(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    if !headers.is_empty() {
        lines.push(headers.join(" | "));
    }
    for row in rows {
        lines.push(row.join(" | "));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_serialization_is_header_then_rows() {
        let headers = vec!["year".to_string(), "revenue".to_string()];
        let rows = vec![
            vec!["2023".to_string(), "10".to_string()],
            vec!["2024".to_string(), "14".to_string()],
        ];
        assert_eq!(
            table_to_text(&headers, &rows),
            "year | revenue\n2023 | 10\n2024 | 14"
        );
    }

    #[test]
    fn table_serialization_without_headers() {
        let rows = vec![vec!["a".to_string(), "b".to_string()]];
        assert_eq!(table_to_text(&[], &rows), "a | b");
    }
}
