pub mod store;
pub mod vector;

pub use store::{GraphError, GraphStats, GraphStore, KnowledgeGraph};
