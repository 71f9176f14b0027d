/// Offline embedding provider based on hashed character n-grams.
///
/// Character bigrams and trigrams of the lower-cased text are hashed into a fixed
/// number of buckets and the resulting count vector is L2-normalized. Works for
/// text without whitespace word boundaries, needs no model download, and is fully
/// deterministic, which makes it the provider of choice for fixtures and tests.

use async_trait::async_trait;

use super::{l2_normalize, EmbeddingError, EmbeddingProvider};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash = FNV_OFFSET;
    let mut buf = [0u8; 4];
    for c in chars {
        for byte in c.encode_utf8(&mut buf).bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

pub struct NgramEmbeddingProvider {
    name: String,
    dim: usize,
}

impl NgramEmbeddingProvider {
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::NotConfigured(
                "ngram embedding dimension must be greater than 0".to_string(),
            ));
        }
        Ok(NgramEmbeddingProvider {
            name: format!("ngram-{}", dimension),
            dim: dimension,
        })
    }

    /// Synchronous embedding, also used to build fixture vector stores.
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let chars: Vec<char> = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        let mut vector = vec![0.0f32; self.dim];
        for n in 2..=3 {
            for window in chars.windows(n) {
                let bucket = (fnv1a(window) % self.dim as u64) as usize;
                vector[bucket] += 1.0;
            }
        }
        // Single-character texts have no windows; fall back to the unigram.
        if chars.len() == 1 {
            let bucket = (fnv1a(&chars) % self.dim as u64) as usize;
            vector[bucket] += 1.0;
        }
        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for NgramEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vectorize(text))
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
