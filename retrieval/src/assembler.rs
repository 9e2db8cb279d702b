//! Context assembly: turn a ranked candidate set into a token-budgeted,
//! type-grouped payload.

use graph::KnowledgeGraph;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tessera_core::config::AssemblyConfig;
use tessera_core::embedding::cosine_similarity;
use tessera_core::model::{Node, NodeContent, NodeKind};
use tracing::debug;

/// Token counting rule. Any implementation is acceptable as long as it is
/// consistent within one assembly call.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Whitespace-separated word count; the default rule.
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSection {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureSection {
    pub image_ref: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    pub text: String,
    pub entity_type: String,
}

/// Assembled, budgeted response payload grouped by kind. `total_tokens`
/// counts packed chunk text only; tables, figures, and entities are capped by
/// count, not by the token budget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub text: Vec<String>,
    pub tables: Vec<TableSection>,
    pub figures: Vec<FigureSection>,
    pub entities: Vec<EntityMention>,
    pub total_tokens: usize,
}

pub struct ContextAssembler {
    config: AssemblyConfig,
    counter: Box<dyn TokenCounter>,
}

impl ContextAssembler {
    pub fn new(config: AssemblyConfig) -> Self {
        Self {
            config,
            counter: Box::new(WhitespaceTokenCounter),
        }
    }

    pub fn with_token_counter(config: AssemblyConfig, counter: Box<dyn TokenCounter>) -> Self {
        Self { config, counter }
    }

    /// Resolve candidates against the graph and pack them under `max_tokens`.
    /// Stale ids are skipped; nodes without an embedding score 0.0 and rank
    /// last within their kind but are never excluded outright.
    pub fn assemble(
        &self,
        candidates: &[String],
        graph: &KnowledgeGraph,
        query_embedding: &[f32],
        max_tokens: usize,
    ) -> Context {
        let mut resolved: Vec<(&Node, f32)> = Vec::new();
        for id in candidates {
            match graph.get(id) {
                Some(node) => {
                    let relevance = node
                        .embedding
                        .as_deref()
                        .and_then(|e| cosine_similarity(query_embedding, e))
                        .unwrap_or(0.0);
                    resolved.push((node, relevance));
                }
                None => debug!(node_id = %id, "stale candidate id, skipping"),
            }
        }

        // Narrative text first, then structured and visual evidence, then raw
        // entity mentions. Id as final key keeps the order reproducible.
        resolved.sort_by(|(a, rel_a), (b, rel_b)| {
            kind_priority(a.kind())
                .cmp(&kind_priority(b.kind()))
                .then_with(|| rel_b.partial_cmp(rel_a).unwrap_or(Ordering::Equal))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut context = Context::default();
        let mut remaining = max_tokens;
        let mut text_budget_open = true;

        for (node, _) in &resolved {
            match &node.content {
                NodeContent::Chunk { text } => {
                    // Greedy packing stops at the first item that would
                    // overflow; an item is taken whole or not at all.
                    if !text_budget_open {
                        continue;
                    }
                    let tokens = self.counter.count(text);
                    if tokens <= remaining {
                        context.text.push(text.clone());
                        remaining -= tokens;
                    } else {
                        text_budget_open = false;
                    }
                }
                NodeContent::Table {
                    headers,
                    rows,
                    caption,
                } => {
                    if context.tables.len() < self.config.max_tables {
                        context.tables.push(TableSection {
                            headers: headers.clone(),
                            rows: rows.clone(),
                            caption: caption.clone(),
                        });
                    }
                }
                NodeContent::Figure { caption, image_ref } => {
                    if context.figures.len() < self.config.max_figures {
                        context.figures.push(FigureSection {
                            image_ref: image_ref.clone(),
                            caption: caption.clone(),
                        });
                    }
                }
                NodeContent::Entity { text, entity_type } => {
                    if context.entities.len() < self.config.max_entities {
                        context.entities.push(EntityMention {
                            text: text.clone(),
                            entity_type: entity_type.clone(),
                        });
                    }
                }
            }
        }

        context.total_tokens = max_tokens - remaining;
        context
    }

    pub fn max_tokens(&self) -> usize {
        self.config.max_tokens
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(AssemblyConfig::default())
    }
}

fn kind_priority(kind: NodeKind) -> u8 {
    match kind {
        NodeKind::Chunk => 1,
        NodeKind::Table => 2,
        NodeKind::Figure => 2,
        NodeKind::Entity => 3,
    }
}
