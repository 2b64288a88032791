//! Collaborator boundaries. Backends and embedders are external systems;
//! everything behind these traits is injected at construction time.

mod backend;
mod embedding;

pub use backend::{Closeable, HealthCheckable, IMemoryBackend, Initializable};
pub use embedding::{FixedEmbedder, IEmbedderResolver, IEmbeddingProvider};
