use sha2::{Digest, Sha256};

/// Cosine similarity between two vectors. Returns `None` when the
/// dimensionalities differ or the vectors are empty, so callers can skip the
/// pair instead of scoring it as zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }

    Some(dot / (norm_a * norm_b))
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn normalize(embedding: &[f32]) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return embedding.to_vec();
    }
    embedding.iter().map(|x| x / norm).collect()
}

/// Weighted sum of same-dimension embeddings, normalized to unit length.
/// Weights default to 1.0 when fewer weights than embeddings are supplied.
/// Returns `None` when the input is empty or dimensions disagree.
pub fn combine(embeddings: &[Vec<f32>], weights: &[f32]) -> Option<Vec<f32>> {
    let first = embeddings.first()?;
    let dims = first.len();
    if dims == 0 || embeddings.iter().any(|e| e.len() != dims) {
        return None;
    }

    let mut combined = vec![0.0f32; dims];
    for (i, embedding) in embeddings.iter().enumerate() {
        let weight = weights.get(i).copied().unwrap_or(1.0);
        for (acc, value) in combined.iter_mut().zip(embedding.iter()) {
            *acc += weight * value;
        }
    }

    Some(normalize(&combined))
}

/// Reproducible pseudo-embedding derived from content and model id. Backs the
/// deterministic stub encoders and test fixtures; real deployments substitute
/// encoder implementations that call an actual model.
pub fn deterministic_embedding(text: &str, model_id: &str, dims: usize) -> Vec<f32> {
    let dims = dims.max(1);

    let mut hasher = Sha256::new();
    hasher.update(model_id.as_bytes());
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();

    let mut out = Vec::with_capacity(dims);
    for i in 0..dims {
        let byte = digest[i % digest.len()];
        let value = (byte as f32 / 127.5) - 1.0;
        out.push(value);
    }

    out
}
