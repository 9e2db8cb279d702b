use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Blend weight between vector similarity and structural importance.
    pub alpha: f32,
    /// Stage-1 candidate width as a multiple of top_k.
    pub width_factor: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            alpha: 0.7,
            width_factor: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AssemblyConfig {
    pub max_tokens: usize,
    pub max_tables: usize,
    pub max_figures: usize,
    pub max_entities: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4000,
            max_tables: 2,
            max_figures: 2,
            max_entities: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Expected dimensionality of attached embeddings; nodes that come back
    /// with a different width are kept without one.
    pub text_dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            text_dimension: 768,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub retrieval: RetrievalConfig,
    pub assembly: AssemblyConfig,
    pub embedding: EmbeddingConfig,
}

impl AppConfig {
    /// Layered load: compiled-in defaults, then `config/default.*` when
    /// present, then `TESSERA_`-prefixed environment variables
    /// (e.g. `TESSERA_RETRIEVAL__ALPHA=0.5`).
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("TESSERA").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.retrieval.alpha, 0.7);
        assert_eq!(cfg.retrieval.width_factor, 2);
        assert_eq!(cfg.assembly.max_tokens, 4000);
        assert_eq!(cfg.assembly.max_tables, 2);
        assert_eq!(cfg.assembly.max_figures, 2);
        assert_eq!(cfg.assembly.max_entities, 5);
        assert_eq!(cfg.embedding.text_dimension, 768);
    }

    #[test]
    fn load_without_files_uses_defaults() {
        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.assembly.max_tokens, 4000);
    }
}
