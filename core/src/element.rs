//! Input records produced by upstream collaborators (chunking, entity
//! extraction, table/figure detection). The engine consumes these as-is and
//! never runs extraction itself.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Sequence linkage from the chunker. Informational only; retrieval
    /// scoring never relies on it.
    #[serde(default)]
    pub prev_id: Option<String>,
    #[serde(default)]
    pub next_id: Option<String>,
}

impl ChunkRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: HashMap::new(),
            prev_id: None,
            next_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub text: String,
    pub entity_type: String,
    /// Source chunk this entity was extracted from, when known.
    #[serde(default)]
    pub chunk_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl EntityRecord {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            entity_type: entity_type.into(),
            chunk_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_chunk(mut self, chunk_id: impl Into<String>) -> Self {
        self.chunk_id = Some(chunk_id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRecord {
    pub id: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureRecord {
    pub id: String,
    #[serde(default)]
    pub caption: String,
    pub image_ref: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub source_id: String,
    pub target_id: String,
    pub relation: String,
    /// Defaulted to 1.0 when the producing collaborator has no confidence.
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl RelationshipRecord {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation: relation.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// One document's worth of extracted elements; input to a single build pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentElements {
    pub chunks: Vec<ChunkRecord>,
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub tables: Vec<TableRecord>,
    #[serde(default)]
    pub figures: Vec<FigureRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

impl DocumentElements {
    /// True when a build pass over these elements would produce an empty
    /// graph: no nodes and no relationships.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
            && self.entities.is_empty()
            && self.tables.is_empty()
            && self.figures.is_empty()
            && self.relationships.is_empty()
    }
}
