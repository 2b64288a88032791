//! Deterministic lexical embedder.
//!
//! Hashes terms into fixed-dimension buckets, weighting each bucket by
//! term frequency and a length-based rarity proxy. Far weaker than a
//! neural model, but always available, dependency-free, and fully
//! deterministic, which keeps every vector-scoring code path exercisable
//! without an external provider.

use std::collections::HashMap;

use prism_core::errors::PrismResult;
use prism_core::similarity::l2_normalize;
use prism_core::traits::IEmbeddingProvider;

const DEFAULT_DIMENSIONS: usize = 256;

pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, term: &str) -> usize {
        let digest = blake3::hash(term.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        (u64::from_le_bytes(prefix) as usize) % self.dimensions
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let terms: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| t.len() >= 2)
            .map(str::to_lowercase)
            .collect();
        if terms.is_empty() {
            return vec![0.0; self.dimensions];
        }

        let mut frequencies: HashMap<&str, f32> = HashMap::new();
        for term in &terms {
            *frequencies.entry(term.as_str()).or_default() += 1.0;
        }

        let total = terms.len() as f32;
        let mut vector = vec![0.0f32; self.dimensions];
        for (term, count) in &frequencies {
            // Longer terms tend to be rarer; weight them up slightly.
            let rarity = 1.0 + (term.len() as f32).ln();
            vector[self.bucket(term)] += (count / total) * rarity;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl IEmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> PrismResult<Vec<f32>> {
        Ok(self.vector(text))
    }

    fn embed_batch(&self, texts: &[String]) -> PrismResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }

    fn is_available(&self) -> bool {
        true
    }
}
