//! Embedding support: a bounded query-vector cache and a deterministic
//! lexical provider for environments without a real embedder.

mod cache;
mod hashing;

pub(crate) use cache::QueryEmbeddingCache;
pub use hashing::HashingEmbedder;
