use thiserror::Error;

use crate::core::ranking::tokenize;

/// Errors raised while producing embeddings
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("Embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty input")]
    EmptyInput,
}

/// Text embedding model
///
/// All vectors produced by one embedder share `dimension()`; `model_id()` must change
/// whenever the vectors would.
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic feature-hashing embedder
///
/// Word tokens and character trigrams are hashed with FNV-1a into signed buckets and
/// the result is L2-normalized, so cosine similarity reduces to a dot product.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_id: format!("fnv1a-hash-v1-{}", dimension),
        }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if self.dimension == 0 {
            return Err(EmbedError::Unavailable("zero-dimension hash embedder".to_string()));
        }

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let mut vector = vec![0.0f32; self.dimension];
        for token in &tokens {
            self.add_feature(&mut vector, token, 1.0);

            let padded: Vec<char> = format!("#{}#", token).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vector, &trigram, TRIGRAM_WEIGHT);
            }
        }

        normalize(&mut vector);
        Ok(vector)
    }
}

#[inline]
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

/// Cosine similarity; zero for empty, mismatched or zero-norm inputs
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("Skilled worker visa Canada").unwrap();
        let b = embedder.embed("Skilled worker visa Canada").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_related_text_scores_higher() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("student visa for university").unwrap();
        let study = embedder.embed("Student Visa study Australia university").unwrap();
        let business = embedder.embed("Investor Stream business Canada").unwrap();

        assert!(cosine_similarity(&query, &study) > cosine_similarity(&query, &business));
    }

    #[test]
    fn test_empty_text_rejected() {
        let embedder = HashEmbedder::new(16);
        assert!(matches!(embedder.embed("  ?! "), Err(EmbedError::EmptyInput)));
    }

    #[test]
    fn test_cosine_guards() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_model_id_tracks_dimension() {
        assert_ne!(HashEmbedder::new(128).model_id(), HashEmbedder::new(256).model_id());
    }
}
