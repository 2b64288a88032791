//! Bounded cache for query embeddings.
//!
//! Embedding the same query twice in quick succession is common: the
//! single-phase path embeds it once per request, and clients frequently
//! re-issue identical searches. Entries are keyed by a blake3 hash over
//! the provider identity and the query text, so two providers never serve
//! each other's vectors.

use std::time::Duration;

use moka::sync::Cache;

const MAX_ENTRIES: u64 = 4096;
const IDLE_TTL: Duration = Duration::from_secs(3600);

pub(crate) struct QueryEmbeddingCache {
    cache: Cache<String, Vec<f32>>,
}

impl QueryEmbeddingCache {
    pub(crate) fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_idle(IDLE_TTL)
            .build();
        Self { cache }
    }

    pub(crate) fn key(provider: &str, model: &str, query: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(provider.as_bytes());
        hasher.update(b"\0");
        hasher.update(model.as_bytes());
        hasher.update(b"\0");
        hasher.update(query.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    pub(crate) fn get(&self, key: &str) -> Option<Vec<f32>> {
        self.cache.get(key)
    }

    pub(crate) fn insert(&self, key: String, embedding: Vec<f32>) {
        self.cache.insert(key, embedding);
    }
}
