pub mod assembler;
pub mod engine;
pub mod retriever;

pub use assembler::{
    Context, ContextAssembler, EntityMention, FigureSection, TableSection, TokenCounter,
    WhitespaceTokenCounter,
};
pub use engine::{ContextEngine, ContextResponse};
pub use retriever::{HybridRetriever, ScoredCandidate};
