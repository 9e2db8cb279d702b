use serde::{Deserialize, Serialize};

/// Per-item, non-fatal issue observed during a build pass. The batch always
/// runs to completion; issues accumulate into the report returned alongside
/// the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum BuildIssue {
    DuplicateNode {
        id: String,
    },
    DanglingEdge {
        source: String,
        target: String,
        relation: String,
    },
    EmbeddingFailure {
        id: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub issues: Vec<BuildIssue>,
}

impl BuildReport {
    pub fn record(&mut self, issue: BuildIssue) {
        self.issues.push(issue);
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn duplicate_nodes(&self) -> impl Iterator<Item = &BuildIssue> {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, BuildIssue::DuplicateNode { .. }))
    }

    pub fn dangling_edges(&self) -> impl Iterator<Item = &BuildIssue> {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, BuildIssue::DanglingEdge { .. }))
    }

    pub fn failed_embeddings(&self) -> impl Iterator<Item = &BuildIssue> {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, BuildIssue::EmbeddingFailure { .. }))
    }
}
