use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The four node kinds a document graph can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Chunk,
    Entity,
    Table,
    Figure,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeKind::Chunk => "chunk",
            NodeKind::Entity => "entity",
            NodeKind::Table => "table",
            NodeKind::Figure => "figure",
        };
        write!(f, "{}", s)
    }
}

/// Kind-dependent payload. Consumers pattern-match exhaustively instead of
/// probing optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeContent {
    Chunk {
        text: String,
    },
    Entity {
        text: String,
        entity_type: String,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        caption: String,
    },
    Figure {
        caption: String,
        /// Opaque reference to the image (path, URL, object key). The core
        /// never decodes it; the image encoder collaborator does.
        image_ref: String,
    },
}

impl NodeContent {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeContent::Chunk { .. } => NodeKind::Chunk,
            NodeContent::Entity { .. } => NodeKind::Entity,
            NodeContent::Table { .. } => NodeKind::Table,
            NodeContent::Figure { .. } => NodeKind::Figure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub content: NodeContent,
    /// Advisory fields (bounding box, source page, ...). Never consulted by
    /// scoring.
    pub metadata: HashMap<String, String>,
    /// Present only after successful embedding attachment.
    pub embedding: Option<Vec<f32>>,
}

impl Node {
    pub fn new(id: impl Into<String>, content: NodeContent) -> Self {
        Self {
            id: id.into(),
            content,
            metadata: HashMap::new(),
            embedding: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.content.kind()
    }
}

/// Directed, typed relation between two node ids. Multiple edges between the
/// same ordered pair with different relations are distinct edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub confidence: f32,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Relation used for entity provenance; always runs Chunk -> Entity.
pub const CONTAINS_RELATION: &str = "contains";

pub fn chunk_node_id(raw: &str) -> String {
    format!("chunk_{raw}")
}

pub fn entity_node_id(raw: &str) -> String {
    format!("entity_{raw}")
}

pub fn table_node_id(raw: &str) -> String {
    format!("table_{raw}")
}

pub fn figure_node_id(raw: &str) -> String {
    format!("figure_{raw}")
}
