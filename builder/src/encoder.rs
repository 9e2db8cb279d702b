//! Encoder seams. Embedding computation is an external collaborator; the
//! builder only consumes the success/failure outcome per call. The
//! deterministic implementations below exist for tests and offline runs.

use std::future::Future;
use std::pin::Pin;
use tessera_core::embedding::deterministic_embedding;
use thiserror::Error;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncoderError {
    #[error("encoder call failed: {0}")]
    Call(String),
    #[error("content not encodable: {0}")]
    Unsupported(String),
}

pub trait TextEncoder: Send + Sync {
    fn encode<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, EncoderError>>;
}

pub trait ImageEncoder: Send + Sync {
    fn encode<'a>(&'a self, image_ref: &'a str) -> BoxFuture<'a, Result<Vec<f32>, EncoderError>>;
}

pub const DEFAULT_TEXT_MODEL_ID: &str = "text-default-v1";
pub const DEFAULT_IMAGE_MODEL_ID: &str = "image-default-v1";

/// Hash-derived text embeddings; reproducible across runs and processes.
pub struct DeterministicTextEncoder {
    dims: usize,
}

impl DeterministicTextEncoder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }
}

impl Default for DeterministicTextEncoder {
    fn default() -> Self {
        Self::new(768)
    }
}

impl TextEncoder for DeterministicTextEncoder {
    fn encode<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, EncoderError>> {
        let dims = self.dims;
        Box::pin(async move { Ok(deterministic_embedding(text, DEFAULT_TEXT_MODEL_ID, dims)) })
    }
}

/// Hash-derived image embeddings keyed on the opaque image reference.
pub struct DeterministicImageEncoder {
    dims: usize,
}

impl DeterministicImageEncoder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }
}

impl Default for DeterministicImageEncoder {
    fn default() -> Self {
        Self::new(768)
    }
}

impl ImageEncoder for DeterministicImageEncoder {
    fn encode<'a>(&'a self, image_ref: &'a str) -> BoxFuture<'a, Result<Vec<f32>, EncoderError>> {
        let dims = self.dims;
        Box::pin(async move {
            if image_ref.is_empty() {
                return Err(EncoderError::Unsupported("empty image reference".to_string()));
            }
            Ok(deterministic_embedding(
                image_ref,
                DEFAULT_IMAGE_MODEL_ID,
                dims,
            ))
        })
    }
}
